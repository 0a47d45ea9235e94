//! Persistent configuration image: identity record plus four fixed-size
//! blocks at fixed offsets inside a 128-byte non-volatile region.
//!
//! The blocks are opaque here — their field layout belongs to the encoder
//! collaborators. The bridge only needs sizes and offsets to move bytes
//! between the wire and storage, and the identity scalars it interprets
//! itself (polling rate, device sub-type).
//!
//! There is no atomic commit: a block write overwrites storage live, byte
//! by byte. A write interrupted mid-block leaves the block inconsistent
//! until it is rewritten in full.

/// Identity tag stored at the start of the region. Anything else there
/// means the region was never written and compiled defaults apply.
pub const DEVICE_TAG: u32 = 0x504C_4B31; // "PLK1"

/// Default USB polling rate in milliseconds.
pub const DEFAULT_POLL_RATE: u8 = 1;

/// Default device sub-type (plain gamepad).
pub const DEFAULT_SUB_TYPE: u8 = crate::report::subtype::GAMEPAD;

/// Total size of the non-volatile config region.
pub const CONFIG_REGION_SIZE: usize = 128;

/// Size of the encoded identity record at offset 0.
pub const IDENTITY_SIZE: usize = 8;

/// Device identity and the two scalar settings the bridge interprets.
///
/// Mirrored into RAM at boot; the scalars are only committed back on
/// apply-config, unlike block writes which hit storage immediately.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Identity {
    pub tag: u32,
    pub poll_rate: u8,
    pub sub_type: u8,
}

impl Identity {
    /// Compiled defaults, used when the stored tag does not match.
    #[must_use]
    pub const fn default_values() -> Self {
        Self {
            tag: DEVICE_TAG,
            poll_rate: DEFAULT_POLL_RATE,
            sub_type: DEFAULT_SUB_TYPE,
        }
    }

    /// Decode from the stored record. Returns `None` when the tag is unset
    /// or unknown (fresh device, erased storage).
    #[must_use]
    pub fn from_bytes(bytes: &[u8; IDENTITY_SIZE]) -> Option<Self> {
        let tag = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if tag != DEVICE_TAG {
            return None;
        }
        Some(Self {
            tag,
            poll_rate: bytes[4],
            sub_type: bytes[5],
        })
    }

    /// Encode for storage. Two trailing bytes are reserved.
    #[must_use]
    pub fn to_bytes(self) -> [u8; IDENTITY_SIZE] {
        let tag = self.tag.to_le_bytes();
        [tag[0], tag[1], tag[2], tag[3], self.poll_rate, self.sub_type, 0, 0]
    }
}

/// The four named configuration blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigBlock {
    /// Main settings.
    Main,
    /// Pin mapping.
    Pins,
    /// Axis calibration.
    Axis,
    /// Key mapping.
    Keys,
}

impl ConfigBlock {
    /// Size of the block in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            ConfigBlock::Main => 16,
            ConfigBlock::Pins => 24,
            ConfigBlock::Axis => 32,
            ConfigBlock::Keys => 48,
        }
    }

    /// Offset of the block inside the config region.
    #[must_use]
    pub const fn offset(self) -> usize {
        match self {
            ConfigBlock::Main => IDENTITY_SIZE,
            ConfigBlock::Pins => IDENTITY_SIZE + 16,
            ConfigBlock::Axis => IDENTITY_SIZE + 16 + 24,
            ConfigBlock::Keys => IDENTITY_SIZE + 16 + 24 + 32,
        }
    }

    /// All blocks, in region order.
    pub const ALL: [ConfigBlock; 4] = [
        ConfigBlock::Main,
        ConfigBlock::Pins,
        ConfigBlock::Axis,
        ConfigBlock::Keys,
    ];
}

/// RAM working copy of the whole config region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfigImage {
    pub identity: Identity,
    pub main: [u8; ConfigBlock::Main.size()],
    pub pins: [u8; ConfigBlock::Pins.size()],
    pub axis: [u8; ConfigBlock::Axis.size()],
    pub keys: [u8; ConfigBlock::Keys.size()],
}

impl ConfigImage {
    /// Image with default identity and zeroed blocks.
    #[must_use]
    pub const fn default_values() -> Self {
        Self {
            identity: Identity::default_values(),
            main: [0; ConfigBlock::Main.size()],
            pins: [0; ConfigBlock::Pins.size()],
            axis: [0; ConfigBlock::Axis.size()],
            keys: [0; ConfigBlock::Keys.size()],
        }
    }

    /// Decode a full region snapshot. Blocks are copied verbatim; the
    /// identity falls back to defaults when the tag is unset.
    #[must_use]
    pub fn from_region(region: &[u8; CONFIG_REGION_SIZE]) -> Self {
        let mut id_bytes = [0u8; IDENTITY_SIZE];
        id_bytes.copy_from_slice(&region[..IDENTITY_SIZE]);
        let identity = Identity::from_bytes(&id_bytes).unwrap_or(Identity::default_values());

        let mut image = Self {
            identity,
            ..Self::default_values()
        };
        for block in ConfigBlock::ALL {
            let src = &region[block.offset()..block.offset() + block.size()];
            image.block_mut(block).copy_from_slice(src);
        }
        image
    }

    /// Borrow a block's bytes.
    #[must_use]
    pub fn block(&self, block: ConfigBlock) -> &[u8] {
        match block {
            ConfigBlock::Main => &self.main,
            ConfigBlock::Pins => &self.pins,
            ConfigBlock::Axis => &self.axis,
            ConfigBlock::Keys => &self.keys,
        }
    }

    /// Borrow a block's bytes mutably.
    pub fn block_mut(&mut self, block: ConfigBlock) -> &mut [u8] {
        match block {
            ConfigBlock::Main => &mut self.main,
            ConfigBlock::Pins => &mut self.pins,
            ConfigBlock::Axis => &mut self.axis,
            ConfigBlock::Keys => &mut self.keys,
        }
    }
}

impl Default for ConfigImage {
    fn default() -> Self {
        Self::default_values()
    }
}

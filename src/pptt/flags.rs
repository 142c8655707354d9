use std::fmt;

bitflags::bitflags! {
    /// Flags of a processor hierarchy node (PPTT type 0).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ProcessorFlags: u32 {
        /// Bit 0: this node is the boundary of a physical package.
        const PHYSICAL_PACKAGE = 1 << 0;
        /// Bit 1: the ACPI processor ID field is valid.
        const ACPI_PROCESSOR_ID_VALID = 1 << 1;
        /// Bit 2: this processor is a hardware thread.
        const PROCESSOR_IS_A_THREAD = 1 << 2;
        /// Bit 3: this node has no children.
        const NODE_IS_A_LEAF = 1 << 3;
        /// Bit 4: all children are identical implementations.
        const IDENTICAL_IMPLEMENTATION = 1 << 4;
    }
}

bitflags::bitflags! {
    /// Flags of a cache type node (PPTT type 1). Each bit says whether the
    /// corresponding field of the node is valid.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CacheFlags: u32 {
        const SIZE_VALID = 1 << 0;
        const NUMBER_OF_SETS_VALID = 1 << 1;
        const ASSOCIATIVITY_VALID = 1 << 2;
        const ALLOCATION_TYPE_VALID = 1 << 3;
        const CACHE_TYPE_VALID = 1 << 4;
        const WRITE_POLICY_VALID = 1 << 5;
        const LINE_SIZE_VALID = 1 << 6;
        const CACHE_ID_VALID = 1 << 7;
    }
}

impl CacheFlags {
    /// The fields needed to describe a cache in the topology graph (`0b111001`).
    pub const DESCRIBED: Self = Self::SIZE_VALID
        .union(Self::ALLOCATION_TYPE_VALID)
        .union(Self::CACHE_TYPE_VALID)
        .union(Self::WRITE_POLICY_VALID);

    /// Whether every field in [`CacheFlags::DESCRIBED`] is valid.
    pub fn is_described(&self) -> bool {
        self.contains(Self::DESCRIBED)
    }
}

/// The attributes byte of a cache type node.
///
/// ```text
/// bits 0..2  allocation type
/// bits 2..4  cache type
/// bit  4     write policy
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheAttributes(pub u8);

impl CacheAttributes {
    const ALLOCATION_TYPE_SHIFT: u8 = 0;
    const ALLOCATION_TYPE_MASK: u8 = 0b11;
    const CACHE_TYPE_SHIFT: u8 = 2;
    const CACHE_TYPE_MASK: u8 = 0b11;
    const WRITE_POLICY_SHIFT: u8 = 4;
    const WRITE_POLICY_MASK: u8 = 0b1;

    pub fn allocation_type(&self) -> AllocationType {
        match (self.0 >> Self::ALLOCATION_TYPE_SHIFT) & Self::ALLOCATION_TYPE_MASK {
            0 => AllocationType::ReadAllocate,
            1 => AllocationType::WriteAllocate,
            _ => AllocationType::ReadWriteAllocate,
        }
    }

    pub fn cache_type(&self) -> CacheType {
        match (self.0 >> Self::CACHE_TYPE_SHIFT) & Self::CACHE_TYPE_MASK {
            0 => CacheType::Data,
            1 => CacheType::Instruction,
            _ => CacheType::Unified,
        }
    }

    pub fn write_policy(&self) -> WritePolicy {
        match (self.0 >> Self::WRITE_POLICY_SHIFT) & Self::WRITE_POLICY_MASK {
            0 => WritePolicy::WriteBack,
            _ => WritePolicy::WriteThrough,
        }
    }
}

/// Encodings 2 and 3 both mean read and write allocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocationType {
    ReadAllocate,
    WriteAllocate,
    ReadWriteAllocate,
}

impl fmt::Display for AllocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ReadAllocate => "RA",
            Self::WriteAllocate => "WA",
            Self::ReadWriteAllocate => "RWA",
        })
    }
}

/// Encodings 2 and 3 both mean unified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheType {
    Data,
    Instruction,
    Unified,
}

impl fmt::Display for CacheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Data => "DCache",
            Self::Instruction => "ICache",
            Self::Unified => "Cache",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WritePolicy {
    WriteBack,
    WriteThrough,
}

impl fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WriteBack => "WB",
            Self::WriteThrough => "WT",
        })
    }
}

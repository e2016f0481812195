use std::{fmt, hash::Hasher};

use crate::shared::constants::HighGuidType;

#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct ObjectGuid {
    high_guid_type: HighGuidType,
    raw: u64,
}

impl ObjectGuid {
    pub fn new(high_guid_type: HighGuidType, counter: u32) -> ObjectGuid {
        let raw = ((high_guid_type as u64) << 48) | counter as u64;

        ObjectGuid {
            high_guid_type,
            raw,
        }
    }

    pub fn from_raw(raw: u64) -> Option<ObjectGuid> {
        let high_part = (raw >> 48) & 0xFFFF;
        HighGuidType::n(high_part as i64).map(|high_guid_type| ObjectGuid {
            high_guid_type,
            raw,
        })
    }

    pub fn with_entry(high_guid_type: HighGuidType, entry: u32, counter: u32) -> ObjectGuid {
        assert!(
            Self::has_entry_part(high_guid_type),
            "Attempt to create an ObjectGuid with an entry for a HighGuidType with no entry part"
        );

        let raw = ((high_guid_type as u64) << 48) | ((entry as u64) << 24) | counter as u64;

        ObjectGuid {
            high_guid_type,
            raw,
        }
    }

    pub fn raw(&self) -> u64 {
        self.raw
    }

    pub fn high_guid_type(&self) -> HighGuidType {
        self.high_guid_type
    }

    pub fn is_player(&self) -> bool {
        self.high_guid_type == HighGuidType::Player
    }

    pub fn entry_part(&self) -> Option<u32> {
        if Self::has_entry_part(self.high_guid_type) {
            Some(((self.raw >> 24) & 0xFFFFFF) as u32)
        } else {
            None
        }
    }

    pub fn counter(&self) -> u32 {
        // Counter is 3 bytes if Guid has entry, 4 bytes otherwise
        if Self::has_entry_part(self.high_guid_type) {
            (self.raw & 0xFFFFFF) as u32
        } else {
            (self.raw & 0xFFFFFFFF) as u32
        }
    }

    fn has_entry_part(high_guid_type: HighGuidType) -> bool {
        match high_guid_type {
            HighGuidType::Player | HighGuidType::Dynamicobject | HighGuidType::Corpse => false,
            HighGuidType::Transport
            | HighGuidType::Unit
            | HighGuidType::Pet
            | HighGuidType::Gameobject => true,
        }
    }
}

impl std::hash::Hash for ObjectGuid {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl fmt::Display for ObjectGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}#{}", self.high_guid_type, self.counter())
    }
}

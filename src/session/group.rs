use serde::Serialize;

/// Stable identity of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupId(pub(crate) u64);

/// Display color of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupColor {
    pub name: &'static str,
    pub hex: &'static str,
}

impl GroupColor {
    /// RGB components of `hex`
    pub fn rgb(&self) -> (u8, u8, u8) {
        let hex = self.hex.trim_start_matches('#');
        let channel = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|c| u8::from_str_radix(c, 16).ok())
                .unwrap_or(0)
        };
        (channel(0), channel(2), channel(4))
    }
}

/// Palette cycled through as groups are created
pub const GROUP_COLORS: [GroupColor; 16] = [
    GroupColor { name: "blue", hex: "#1e3a8a" },
    GroupColor { name: "teal", hex: "#134e4a" },
    GroupColor { name: "purple", hex: "#4c1d95" },
    GroupColor { name: "amber", hex: "#78350f" },
    GroupColor { name: "rose", hex: "#881337" },
    GroupColor { name: "sky", hex: "#082f49" },
    GroupColor { name: "lime", hex: "#365314" },
    GroupColor { name: "slate", hex: "#1e293b" },
    GroupColor { name: "cyan", hex: "#164e63" },
    GroupColor { name: "fuchsia", hex: "#701a75" },
    GroupColor { name: "red", hex: "#7f1d1d" },
    GroupColor { name: "indigo", hex: "#312e81" },
    GroupColor { name: "pink", hex: "#831843" },
    GroupColor { name: "stone", hex: "#292524" },
    GroupColor { name: "emerald", hex: "#064e3b" },
    GroupColor { name: "zinc", hex: "#18181b" },
];

/// Contiguous run of scenes sharing one loop-start
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: GroupId,
    /// Shared loop-start in seconds
    pub loop_start: f64,
    pub color: GroupColor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_rgb() {
        assert_eq!(GROUP_COLORS[0].rgb(), (0x1e, 0x3a, 0x8a));
        assert_eq!(GROUP_COLORS[15].rgb(), (0x18, 0x18, 0x1b));
    }
}

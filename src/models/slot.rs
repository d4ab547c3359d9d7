use std::fmt;

use serde::{Deserialize, Serialize};

pub const SLOT_LABELS: [&str; 10] = [
    "11:00 AM - 12:00 PM",
    "12:15 PM - 1:15 PM",
    "1:30 PM - 2:30 PM",
    "2:45 PM - 3:45 PM",
    "4:00 PM - 5:00 PM",
    "5:15 PM - 6:15 PM",
    "6:30 PM - 7:30 PM",
    "7:45 PM - 8:45 PM",
    "9:00 PM - 10:00 PM",
    "10:15 PM - 11:15 PM",
];

/// One of the fixed daily intervals. Serialized as its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSlot(usize);

impl TimeSlot {
    pub fn all() -> impl Iterator<Item = TimeSlot> {
        (0..SLOT_LABELS.len()).map(TimeSlot)
    }

    pub fn parse(label: &str) -> Option<Self> {
        let wanted = normalize(label);
        SLOT_LABELS
            .iter()
            .position(|l| normalize(l) == wanted)
            .map(TimeSlot)
    }

    pub fn label(&self) -> &'static str {
        SLOT_LABELS[self.0]
    }
}

// Accept "11:00 am-12:00 pm" as well as the canonical spacing.
fn normalize(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TimeSlot::parse(&value).ok_or_else(|| format!("unknown time slot: {value}"))
    }
}

impl From<TimeSlot> for String {
    fn from(slot: TimeSlot) -> Self {
        slot.label().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_fixed_slots_in_order() {
        let slots: Vec<_> = TimeSlot::all().collect();
        assert_eq!(slots.len(), 10);
        assert_eq!(slots[0].label(), "11:00 AM - 12:00 PM");
        assert_eq!(slots[9].label(), "10:15 PM - 11:15 PM");
        assert!(slots.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_parse_tolerates_spacing_and_case() {
        assert_eq!(
            TimeSlot::parse("11:00 am-12:00 pm").map(|s| s.label()),
            Some("11:00 AM - 12:00 PM")
        );
        assert!(TimeSlot::parse("3:00 AM - 4:00 AM").is_none());
    }

    #[test]
    fn test_serde_uses_label() {
        let slot = TimeSlot::parse("9:00 PM - 10:00 PM").unwrap();
        let json = serde_json::to_string(&slot).unwrap();
        assert_eq!(json, "\"9:00 PM - 10:00 PM\"");
        let back: TimeSlot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, slot);
        assert!(serde_json::from_str::<TimeSlot>("\"noon\"").is_err());
    }
}

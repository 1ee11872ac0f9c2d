use serde::{Deserialize, Serialize};

pub const CHILD_PRICE: u64 = 10;
pub const STUDENT_PRICE: u64 = 15;
pub const ADULT_PRICE: u64 = 20;

/// Tickets per category. Categories the visitor did not ask for stay at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketCounts {
    pub adult: u32,
    pub student: u32,
    pub child: u32,
}

impl TicketCounts {
    pub fn new(adult: u32, student: u32, child: u32) -> Self {
        Self { adult, student, child }
    }

    /// What the price table says the booking should cost.
    pub fn expected_amount(&self) -> u64 {
        CHILD_PRICE * u64::from(self.child)
            + STUDENT_PRICE * u64::from(self.student)
            + ADULT_PRICE * u64::from(self.adult)
    }

    /// One-line form used in the booking QR and the confirmation email.
    pub fn summary(&self) -> String {
        format!(
            "{} Adult, {} Student, {} Children",
            self.adult, self.student, self.child
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_amount_uses_price_table() {
        let counts = TicketCounts::new(2, 1, 3);
        assert_eq!(counts.expected_amount(), 2 * 20 + 15 + 3 * 10);
    }

    #[test]
    fn test_default_counts_are_zero() {
        let counts = TicketCounts::default();
        assert_eq!(counts.expected_amount(), 0);
        assert_eq!(counts.summary(), "0 Adult, 0 Student, 0 Children");
    }
}

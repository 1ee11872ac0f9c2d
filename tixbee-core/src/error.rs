use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

/// Fields recovered from the booking summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingField {
    Email,
    Attraction,
    VisitDate,
    Tickets,
    Amount,
}

impl BookingField {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingField::Email => "email",
            BookingField::Attraction => "attraction",
            BookingField::VisitDate => "visit_date",
            BookingField::Tickets => "tickets",
            BookingField::Amount => "amount",
        }
    }
}

impl fmt::Display for BookingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// A required label was absent, empty, or its value did not validate.
    #[error("missing field: {0}")]
    MissingField(BookingField),

    #[error("visit date {date} is before {today}")]
    VisitDateInPast { date: NaiveDate, today: NaiveDate },
}

impl ExtractionError {
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionError::MissingField(_) => "MISSING_FIELD",
            ExtractionError::VisitDateInPast { .. } => "VISIT_DATE_IN_PAST",
        }
    }

    pub fn field(&self) -> BookingField {
        match self {
            ExtractionError::MissingField(field) => *field,
            ExtractionError::VisitDateInPast { .. } => BookingField::VisitDate,
        }
    }
}

use std::fmt;

use uuid::Uuid;

/// Per-request log context, passed explicitly down the fetch pipeline.
///
/// Displays as `req=<id> reg=<registration number>` so every log line of one
/// lookup can be grepped together.
#[derive(Debug, Clone)]
pub struct FetchContext {
    pub request_id: Uuid,
    pub registration_number: String,
}

impl FetchContext {
    pub fn new(registration_number: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            registration_number: registration_number.into(),
        }
    }
}

impl fmt::Display for FetchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "req={} reg={}",
            self.request_id, self.registration_number
        )
    }
}

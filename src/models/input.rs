use crate::error::InputError;
use serde::{Deserialize, Serialize};

pub const MIN_INPUT_CHARS: usize = 10;
pub const MAX_INPUT_CHARS: usize = 5000;

/// Raw text accepted at the pipeline boundary, whitespace-collapsed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputText(String);

impl InputText {
    pub fn parse(raw: &str) -> Result<Self, InputError> {
        let cleaned = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        let len = cleaned.chars().count();
        if len < MIN_INPUT_CHARS {
            return Err(InputError::TooShort {
                len,
                min: MIN_INPUT_CHARS,
            });
        }
        if len > MAX_INPUT_CHARS {
            return Err(InputError::TooLong {
                len,
                max: MAX_INPUT_CHARS,
            });
        }
        Ok(Self(cleaned))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

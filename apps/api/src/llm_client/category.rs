use std::fmt;

use serde::{Deserialize, Serialize};

/// Workload bucket for an outbound AI call. Decides which key pool and which
/// concurrency limiter the call goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Chapter,
    Quiz,
    Flashcard,
    Game,
    Article,
    Groq,
}

/// Which upstream API serves a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    Groq,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 6] = [
        ServiceCategory::Chapter,
        ServiceCategory::Quiz,
        ServiceCategory::Flashcard,
        ServiceCategory::Game,
        ServiceCategory::Article,
        ServiceCategory::Groq,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceCategory::Chapter => "chapter",
            ServiceCategory::Quiz => "quiz",
            ServiceCategory::Flashcard => "flashcard",
            ServiceCategory::Game => "game",
            ServiceCategory::Article => "article",
            ServiceCategory::Groq => "groq",
        }
    }

    pub fn provider(self) -> Provider {
        match self {
            ServiceCategory::Groq => Provider::Groq,
            _ => Provider::Gemini,
        }
    }

    /// Simultaneous in-flight calls allowed for this category.
    /// `None` means the category has no limiter of its own and shares the
    /// one named by [`ServiceCategory::limiter_category`].
    pub fn capacity(self) -> Option<usize> {
        match self {
            ServiceCategory::Chapter => Some(3),
            ServiceCategory::Quiz => Some(2),
            ServiceCategory::Flashcard => Some(2),
            ServiceCategory::Game => Some(1),
            ServiceCategory::Article => Some(1),
            ServiceCategory::Groq => None,
        }
    }

    /// The category whose limiter admits calls for `self`.
    pub fn limiter_category(self) -> ServiceCategory {
        match self.capacity() {
            Some(_) => self,
            None => ServiceCategory::Chapter,
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

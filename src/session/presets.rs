use serde::{Deserialize, Serialize};

/// Canned questions offered next to the free-form input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickQuestion {
    Summary,
    Experience,
    Education,
    Skills,
}

impl QuickQuestion {
    pub const ALL: [QuickQuestion; 4] = [
        QuickQuestion::Summary,
        QuickQuestion::Experience,
        QuickQuestion::Education,
        QuickQuestion::Skills,
    ];

    pub fn label(self) -> &'static str {
        match self {
            QuickQuestion::Summary => "Profile Summary",
            QuickQuestion::Experience => "Experience",
            QuickQuestion::Education => "Education",
            QuickQuestion::Skills => "Skills",
        }
    }

    pub fn question(self) -> &'static str {
        match self {
            QuickQuestion::Summary => "Can you provide a comprehensive summary of this profile?",
            QuickQuestion::Experience => "What is their professional experience background?",
            QuickQuestion::Education => "Tell me about their educational background",
            QuickQuestion::Skills => "What skills and expertise does this person have?",
        }
    }
}

// SPDX-License-Identifier: MIT

//! Category registry: static display metadata per category key.

use serde::Serialize;

/// Display metadata for one activity category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryMeta {
    pub key: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub label: &'static str,
}

/// All registered categories. `other` is last and doubles as the
/// fallback entry for unrecognized keys.
pub const CATEGORIES: [CategoryMeta; 10] = [
    CategoryMeta {
        key: "work",
        icon: "💼",
        color: "#6366f1",
        label: "Work",
    },
    CategoryMeta {
        key: "study",
        icon: "📚",
        color: "#8b5cf6",
        label: "Study",
    },
    CategoryMeta {
        key: "sleep",
        icon: "😴",
        color: "#6366f1",
        label: "Sleep",
    },
    CategoryMeta {
        key: "exercise",
        icon: "🏃",
        color: "#22c55e",
        label: "Exercise",
    },
    CategoryMeta {
        key: "entertainment",
        icon: "🎮",
        color: "#f59e0b",
        label: "Entertainment",
    },
    CategoryMeta {
        key: "meals",
        icon: "🍽️",
        color: "#ef4444",
        label: "Meals",
    },
    CategoryMeta {
        key: "commute",
        icon: "🚗",
        color: "#14b8a6",
        label: "Commute",
    },
    CategoryMeta {
        key: "personal",
        icon: "🧘",
        color: "#ec4899",
        label: "Personal Care",
    },
    CategoryMeta {
        key: "social",
        icon: "👥",
        color: "#3b82f6",
        label: "Social",
    },
    CategoryMeta {
        key: "other",
        icon: "📌",
        color: "#71717a",
        label: "Other",
    },
];

/// Look up display metadata for a category key.
///
/// Total function: unrecognized (or empty) keys return the `other`
/// entry rather than failing.
pub fn lookup(key: &str) -> &'static CategoryMeta {
    CATEGORIES
        .iter()
        .find(|c| c.key == key)
        .unwrap_or(&CATEGORIES[CATEGORIES.len() - 1])
}

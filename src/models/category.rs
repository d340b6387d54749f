//! Expense category and income source definitions
//!
//! Both lists are stored whole under a single key. Records refer to them by
//! name, not id, so removing a definition never orphans an expense.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named expense category or income source with display hints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    pub id: String,
    pub name: String,

    /// Icon name for whatever front end renders the list
    #[serde(default)]
    pub icon: String,

    /// Hex color, e.g. "#FF6B6B"
    #[serde(default)]
    pub color: String,
}

impl CategoryDefinition {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        icon: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
            color: color.into(),
        }
    }

    /// Validate the definition
    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        if self.name.trim().is_empty() {
            return Err(CategoryValidationError::EmptyName);
        }

        if self.name.len() > 50 {
            return Err(CategoryValidationError::NameTooLong(self.name.len()));
        }

        Ok(())
    }
}

impl fmt::Display for CategoryDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Which definition list a category belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryList {
    Expense,
    IncomeSource,
}

impl CategoryList {
    /// Store key holding the whole list
    pub fn key(&self) -> &'static str {
        match self {
            Self::Expense => "expense_categories",
            Self::IncomeSource => "income_sources",
        }
    }

    /// The list written on first start
    pub fn defaults(&self) -> Vec<CategoryDefinition> {
        let entries: &[(&str, &str, &str, &str)] = match self {
            Self::Expense => &[
                ("1", "Food", "fast-food", "#FF6B6B"),
                ("2", "Transport", "car", "#4ECDC4"),
                ("3", "Entertainment", "game-controller", "#45B7D1"),
                ("4", "Utilities", "receipt", "#FFA07A"),
                ("5", "Health", "medkit", "#98D8C8"),
                ("6", "Education", "school", "#A8E6CF"),
                ("7", "Clothing", "shirt", "#FFD3B6"),
                ("8", "Home", "home", "#FFAAA5"),
                ("9", "Other", "ellipsis-horizontal", "#95A5A6"),
            ],
            Self::IncomeSource => &[
                ("1", "Salary", "cash", "#2ECC71"),
                ("2", "Freelance", "laptop", "#3498DB"),
                ("3", "Business", "business", "#9B59B6"),
                ("4", "Investments", "trending-up", "#1ABC9C"),
                ("5", "Bonus", "gift", "#F39C12"),
                ("6", "Sales", "cart", "#E74C3C"),
                ("7", "Other", "add-circle", "#95A5A6"),
            ],
        };

        entries
            .iter()
            .map(|(id, name, icon, color)| CategoryDefinition::new(*id, *name, *icon, *color))
            .collect()
    }
}

/// Validation errors for category definitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryValidationError {
    EmptyName,
    NameTooLong(usize),
}

impl fmt::Display for CategoryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Category name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Category name too long ({} chars, max 50)", len)
            }
        }
    }
}

impl std::error::Error for CategoryValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let expense = CategoryList::Expense.defaults();
        assert_eq!(expense.len(), 9);
        assert!(expense.iter().all(|c| c.validate().is_ok()));

        let sources = CategoryList::IncomeSource.defaults();
        assert_eq!(sources.len(), 7);
        assert_eq!(sources[0].name, "Salary");
    }

    #[test]
    fn test_keys() {
        assert_eq!(CategoryList::Expense.key(), "expense_categories");
        assert_eq!(CategoryList::IncomeSource.key(), "income_sources");
    }

    #[test]
    fn test_validation() {
        let empty = CategoryDefinition::new("x", "  ", "", "");
        assert_eq!(empty.validate(), Err(CategoryValidationError::EmptyName));

        let long = CategoryDefinition::new("x", "a".repeat(51), "", "");
        assert_eq!(long.validate(), Err(CategoryValidationError::NameTooLong(51)));
    }
}

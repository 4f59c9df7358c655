//! Sticker job input model

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An RGB colour written as `RRGGBB` in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Colour scheme of the generated document; layout is identical for both
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn heading_color(&self) -> Color {
        match self {
            Theme::Light => Color::rgb(0x00, 0x00, 0x00),
            Theme::Dark => Color::rgb(0x2D, 0x89, 0xEF),
        }
    }

    pub fn text_color(&self) -> Color {
        match self {
            Theme::Light => Color::rgb(0x00, 0x00, 0x00),
            Theme::Dark => Color::rgb(0xF2, 0xF2, 0xF2),
        }
    }

    /// Page background, `None` leaves the page white
    pub fn background(&self) -> Option<Color> {
        match self {
            Theme::Light => None,
            Theme::Dark => Some(Color::rgb(0x12, 0x12, 0x12)),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(Error::InvalidInput(format!("Unknown theme: {}", other))),
        }
    }
}

/// One labelled product attribute printed on the front side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductField {
    pub label: String,
    pub value: String,
}

impl ProductField {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// The single line rendered for this field
    pub fn line(&self) -> String {
        format!("{}: {}", self.label.trim(), self.value.trim())
    }
}

impl FromStr for ProductField {
    type Err = Error;

    /// Parse `Label=Value`
    fn from_str(s: &str) -> Result<Self> {
        let (label, value) = s
            .split_once('=')
            .ok_or_else(|| Error::InvalidInput(format!("Expected Label=Value, got: {}", s)))?;
        Ok(ProductField::new(label.trim(), value.trim()))
    }
}

/// Everything needed to produce one front/back sticker pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickerJob {
    pub customer_name: String,
    pub job_number: String,
    #[serde(default)]
    pub product_fields: Vec<ProductField>,
    #[serde(default)]
    pub theme: Theme,
}

impl StickerJob {
    pub fn new(customer_name: impl Into<String>, job_number: impl Into<String>) -> Self {
        Self {
            customer_name: customer_name.into(),
            job_number: job_number.into(),
            product_fields: Vec::new(),
            theme: Theme::default(),
        }
    }

    pub fn with_field(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.product_fields.push(ProductField::new(label, value));
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Load a job from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| Error::InvalidInput(format!("{}: {}", path.display(), e)))
    }

    /// Check required fields before any document work starts
    pub fn validate(&self) -> Result<()> {
        if self.customer_name.trim().is_empty() {
            return Err(Error::InvalidInput("customer name is required".to_string()));
        }
        if self.job_number.trim().is_empty() {
            return Err(Error::InvalidInput("job number is required".to_string()));
        }
        for (i, field) in self.product_fields.iter().enumerate() {
            if field.label.trim().is_empty() {
                return Err(Error::InvalidInput(format!(
                    "product field {} has an empty label",
                    i + 1
                )));
            }
            if field.value.trim().is_empty() {
                return Err(Error::InvalidInput(format!(
                    "product field '{}' has an empty value",
                    field.label.trim()
                )));
            }
        }
        Ok(())
    }
}

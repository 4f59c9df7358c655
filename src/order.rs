//! Production order expansion
//!
//! A UPS or battery charger order produces one sticker pair per unit. Each
//! unit gets a serial number of the form `LL/{fy}/{job}-OP{op}/{suffix}`.

use std::fmt;
use std::ops::RangeInclusive;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fiscal::FiscalYear;
use crate::job::{ProductField, StickerJob, Theme};

pub const KVA_RANGE: RangeInclusive<u32> = 0..=99_999;
pub const UPS_SETS_RANGE: RangeInclusive<u32> = 1..=20;
pub const UPS_PER_SET_RANGE: RangeInclusive<u32> = 1..=20;
pub const CHARGERS_RANGE: RangeInclusive<u32> = 1..=20;
pub const JOB_OP_RANGE: RangeInclusive<u32> = 1..=999_999;

/// Prefix of every serial number
const SERIAL_PREFIX: &str = "LL";

/// What is being built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProductOrder {
    Ups {
        kva_rating: u32,
        sets: u32,
        units_per_set: u32,
    },
    Charger {
        #[serde(default)]
        voltage: String,
        #[serde(default)]
        current: String,
        #[serde(default)]
        battery_capacity: String,
        charger_type: String,
        battery_type: String,
        count: u32,
        /// Number chargers from 0 instead of 1; charger 0 has no index suffix
        #[serde(default)]
        start_from_zero: bool,
        /// Print the rating label; otherwise the customer name stands in for it
        #[serde(default = "default_true")]
        show_label: bool,
    },
}

fn default_true() -> bool {
    true
}

impl ProductOrder {
    /// Short name used in output filenames
    pub fn kind(&self) -> &'static str {
        match self {
            ProductOrder::Ups { .. } => "UPS",
            ProductOrder::Charger { .. } => "CHARGER",
        }
    }
}

impl fmt::Display for ProductOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// A customer order to expand into sticker jobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub customer_name: String,
    pub job_number: u32,
    pub op_number: u32,
    pub fiscal_year: FiscalYearField,
    pub product: ProductOrder,
    #[serde(default)]
    pub theme: Theme,
}

/// Fiscal year as stored in order files (`"25-26"`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FiscalYearField(pub FiscalYear);

impl TryFrom<String> for FiscalYearField {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        FiscalYear::parse(&value).map(FiscalYearField)
    }
}

impl From<FiscalYearField> for String {
    fn from(value: FiscalYearField) -> Self {
        value.0.to_string()
    }
}

fn check_range(name: &str, value: u32, range: &RangeInclusive<u32>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "{} must be between {} and {}, got {}",
            name,
            range.start(),
            range.end(),
            value
        )))
    }
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::InvalidInput(format!("{} is required", name)))
    } else {
        Ok(())
    }
}

impl OrderRequest {
    pub fn validate(&self) -> Result<()> {
        require("Customer name", &self.customer_name)?;
        check_range("Job number", self.job_number, &JOB_OP_RANGE)?;
        check_range("OP number", self.op_number, &JOB_OP_RANGE)?;

        match &self.product {
            ProductOrder::Ups {
                kva_rating,
                sets,
                units_per_set,
            } => {
                check_range("kVA rating", *kva_rating, &KVA_RANGE)?;
                check_range("UPS sets", *sets, &UPS_SETS_RANGE)?;
                check_range("UPS per set", *units_per_set, &UPS_PER_SET_RANGE)?;
            }
            ProductOrder::Charger {
                voltage,
                current,
                battery_capacity,
                count,
                show_label,
                ..
            } => {
                check_range("Number of chargers", *count, &CHARGERS_RANGE)?;
                if *show_label {
                    let missing: Vec<&str> = [
                        ("Voltage", voltage),
                        ("Current", current),
                        ("Battery Capacity", battery_capacity),
                    ]
                    .into_iter()
                    .filter(|(_, value)| value.trim().is_empty())
                    .map(|(name, _)| name)
                    .collect();
                    if !missing.is_empty() {
                        return Err(Error::InvalidInput(format!(
                            "Please fill in: {}",
                            missing.join(", ")
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn serial(&self, suffix: &str) -> String {
        format!(
            "{}/{}/{}-OP{}/{}",
            SERIAL_PREFIX, self.fiscal_year.0, self.job_number, self.op_number, suffix
        )
    }

    fn job(&self, customer: &str, product_label: String, serial: String) -> StickerJob {
        StickerJob {
            customer_name: customer.to_string(),
            job_number: serial.clone(),
            product_fields: vec![
                ProductField::new("Product", product_label),
                ProductField::new("Sl. No.", serial),
            ],
            theme: self.theme,
        }
    }

    /// Total pages the expanded document will have
    pub fn page_count(&self) -> usize {
        let stickers = match &self.product {
            ProductOrder::Ups { sets, units_per_set, .. } => {
                let units = if *units_per_set > 1 { units_per_set + 1 } else { 1 };
                (sets * units) as usize
            }
            ProductOrder::Charger { count, .. } => *count as usize,
        };
        stickers * 2
    }

    /// One sticker job per physical unit, in production order
    pub fn expand(&self) -> Result<Vec<StickerJob>> {
        self.validate()?;
        let customer = self.customer_name.trim().to_uppercase();

        let jobs = match &self.product {
            ProductOrder::Ups {
                kva_rating,
                sets,
                units_per_set,
            } => {
                let mut units: Vec<(String, String)> = (1..=*units_per_set)
                    .map(|i| (format!("UPS{}", i), format!("UPS{}", i)))
                    .collect();
                if *units_per_set > 1 {
                    units.push(("BYPASS".to_string(), "BYP".to_string()));
                }

                let mut jobs = Vec::new();
                for _ in 0..*sets {
                    for (unit, suffix) in &units {
                        let label = format!("{}kVA {} ({})", kva_rating, unit, customer);
                        jobs.push(self.job(&customer, label, self.serial(suffix)));
                    }
                }
                jobs
            }
            ProductOrder::Charger {
                voltage,
                current,
                battery_capacity,
                charger_type,
                battery_type,
                count,
                start_from_zero,
                show_label,
            } => {
                let first = if *start_from_zero { 0 } else { 1 };
                (first..first + count)
                    .map(|i| {
                        let index = if i == 0 { String::new() } else { i.to_string() };
                        let label = if *show_label {
                            format!(
                                "{}V/{}A {} for {}Ah {} battery ({})",
                                voltage.trim(),
                                current.trim(),
                                charger_type.trim(),
                                battery_capacity.trim(),
                                battery_type.trim(),
                                customer
                            )
                        } else {
                            customer.clone()
                        };
                        self.job(&customer, label, self.serial(&format!("BCH{}", index)))
                    })
                    .collect()
            }
        };

        info!(
            "Expanded {} order for {} into {} sticker(s)",
            self.product,
            customer,
            jobs.len()
        );
        Ok(jobs)
    }

    /// Default filename: `Sticker_{CUSTOMER}_{job}_{op}_{UPS|CHARGER}.docx`
    pub fn file_name(&self) -> String {
        crate::output::sanitize_file_name(&format!(
            "Sticker_{}_{}_{}_{}.docx",
            self.customer_name.trim().to_uppercase(),
            self.job_number,
            self.op_number,
            self.product.kind()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ups(sets: u32, units_per_set: u32) -> OrderRequest {
        OrderRequest {
            customer_name: "acme corp".to_string(),
            job_number: 1234,
            op_number: 5,
            fiscal_year: FiscalYearField(FiscalYear::new(2025)),
            product: ProductOrder::Ups {
                kva_rating: 30,
                sets,
                units_per_set,
            },
            theme: Theme::Light,
        }
    }

    fn charger(count: u32, start_from_zero: bool, show_label: bool) -> OrderRequest {
        OrderRequest {
            product: ProductOrder::Charger {
                voltage: "110".to_string(),
                current: "20".to_string(),
                battery_capacity: "200".to_string(),
                charger_type: "FCBC".to_string(),
                battery_type: "VRLA".to_string(),
                count,
                start_from_zero,
                show_label,
            },
            ..ups(1, 1)
        }
    }

    #[test]
    fn test_single_ups_has_no_bypass() {
        let jobs = ups(1, 1).expand().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job_number, "LL/25-26/1234-OP5/UPS1");
        assert_eq!(jobs[0].customer_name, "ACME CORP");
        assert_eq!(jobs[0].product_fields[0].value, "30kVA UPS1 (ACME CORP)");
    }

    #[test]
    fn test_parallel_ups_adds_bypass_per_set() {
        let order = ups(2, 3);
        let jobs = order.expand().unwrap();
        // 3 units + bypass, twice
        assert_eq!(jobs.len(), 8);
        assert_eq!(order.page_count(), 16);
        let serials: Vec<&str> = jobs.iter().map(|j| j.job_number.as_str()).collect();
        assert_eq!(serials[3], "LL/25-26/1234-OP5/BYP");
        assert_eq!(serials[4], "LL/25-26/1234-OP5/UPS1");
        assert!(jobs[3].product_fields[0].value.starts_with("30kVA BYPASS"));
    }

    #[test]
    fn test_charger_indexing_from_one() {
        let jobs = charger(3, false, true).expand().unwrap();
        let serials: Vec<&str> = jobs.iter().map(|j| j.job_number.as_str()).collect();
        assert_eq!(
            serials,
            vec![
                "LL/25-26/1234-OP5/BCH1",
                "LL/25-26/1234-OP5/BCH2",
                "LL/25-26/1234-OP5/BCH3"
            ]
        );
        assert_eq!(
            jobs[0].product_fields[0].value,
            "110V/20A FCBC for 200Ah VRLA battery (ACME CORP)"
        );
    }

    #[test]
    fn test_charger_indexing_from_zero() {
        let jobs = charger(2, true, false).expand().unwrap();
        assert_eq!(jobs[0].job_number, "LL/25-26/1234-OP5/BCH");
        assert_eq!(jobs[1].job_number, "LL/25-26/1234-OP5/BCH1");
        assert_eq!(jobs[0].product_fields[0].value, "ACME CORP");
    }

    #[test]
    fn test_charger_label_requires_ratings() {
        let mut order = charger(1, false, true);
        if let ProductOrder::Charger { voltage, current, .. } = &mut order.product {
            voltage.clear();
            current.clear();
        }
        let err = order.expand().unwrap_err();
        assert!(err.to_string().contains("Voltage, Current"));

        // Without the label the ratings are not needed
        if let ProductOrder::Charger { show_label, .. } = &mut order.product {
            *show_label = false;
        }
        assert!(order.expand().is_ok());
    }

    #[test]
    fn test_range_limits() {
        assert!(ups(0, 1).validate().is_err());
        assert!(ups(21, 1).validate().is_err());
        assert!(ups(1, 21).validate().is_err());
        assert!(charger(0, false, true).validate().is_err());

        let mut order = ups(1, 1);
        order.job_number = 1_000_000;
        assert!(order.validate().is_err());

        order.job_number = 1;
        order.customer_name = "  ".to_string();
        assert!(matches!(order.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(ups(1, 1).file_name(), "Sticker_ACME CORP_1234_5_UPS.docx");
        let mut order = charger(1, false, true);
        order.customer_name = "a/b:c".to_string();
        assert_eq!(order.file_name(), "Sticker_A_B_C_1234_5_CHARGER.docx");
    }

    #[test]
    fn test_order_from_json() {
        let order: OrderRequest = serde_json::from_str(
            r#"{
                "customer_name": "Acme",
                "job_number": 7,
                "op_number": 2,
                "fiscal_year": "24-25",
                "product": {"type": "ups", "kva_rating": 10, "sets": 1, "units_per_set": 2}
            }"#,
        )
        .unwrap();
        assert_eq!(order.fiscal_year.0, FiscalYear::new(2024));
        assert_eq!(order.expand().unwrap().len(), 3);

        let bad = serde_json::from_str::<OrderRequest>(
            r#"{"customer_name":"A","job_number":1,"op_number":1,"fiscal_year":"24-26",
                "product":{"type":"ups","kva_rating":1,"sets":1,"units_per_set":1}}"#,
        );
        assert!(bad.is_err());
    }
}

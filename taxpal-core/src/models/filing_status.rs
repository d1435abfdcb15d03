use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilingStatusCode {
    #[serde(rename = "S")]
    Single,
    #[serde(rename = "MFJ")]
    MarriedFilingJointly,
    #[serde(rename = "MFS")]
    MarriedFilingSeparately,
    #[serde(rename = "HOH")]
    HeadOfHousehold,
    #[serde(rename = "QSS")]
    QualifyingSurvivingSpouse,
}

impl FilingStatusCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "S",
            Self::MarriedFilingJointly => "MFJ",
            Self::MarriedFilingSeparately => "MFS",
            Self::HeadOfHousehold => "HOH",
            Self::QualifyingSurvivingSpouse => "QSS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "S" => Some(Self::Single),
            "MFJ" => Some(Self::MarriedFilingJointly),
            "MFS" => Some(Self::MarriedFilingSeparately),
            "HOH" => Some(Self::HeadOfHousehold),
            "QSS" => Some(Self::QualifyingSurvivingSpouse),
            _ => None,
        }
    }

    /// IRS rate schedule that applies to this filing status.
    ///
    /// - Schedule X → Single
    /// - Schedule Y-1 → Married Filing Jointly and Qualifying Surviving Spouse
    /// - Schedule Y-2 → Married Filing Separately
    /// - Schedule Z → Head of Household
    pub fn schedule(&self) -> &'static str {
        match self {
            Self::Single => "X",
            Self::MarriedFilingJointly | Self::QualifyingSurvivingSpouse => "Y-1",
            Self::MarriedFilingSeparately => "Y-2",
            Self::HeadOfHousehold => "Z",
        }
    }
}

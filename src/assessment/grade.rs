use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::Rate;

/// credit grade bands, 1 is the best risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CreditGrade {
    Grade1,
    Grade2,
    Grade3,
    Grade4,
    Grade5,
    Grade6,
    Grade7,
    Grade8,
    Grade9,
    Grade10,
}

impl CreditGrade {
    pub const ALL: [CreditGrade; 10] = [
        CreditGrade::Grade1,
        CreditGrade::Grade2,
        CreditGrade::Grade3,
        CreditGrade::Grade4,
        CreditGrade::Grade5,
        CreditGrade::Grade6,
        CreditGrade::Grade7,
        CreditGrade::Grade8,
        CreditGrade::Grade9,
        CreditGrade::Grade10,
    ];

    /// (min score, max score, base annual rate in percent)
    fn band(&self) -> (u32, u32, Decimal) {
        match self {
            CreditGrade::Grade1 => (900, 1000, dec!(3.5)),
            CreditGrade::Grade2 => (850, 899, dec!(4.5)),
            CreditGrade::Grade3 => (800, 849, dec!(5.5)),
            CreditGrade::Grade4 => (750, 799, dec!(6.5)),
            CreditGrade::Grade5 => (700, 749, dec!(7.5)),
            CreditGrade::Grade6 => (650, 699, dec!(9.0)),
            CreditGrade::Grade7 => (600, 649, dec!(10.5)),
            CreditGrade::Grade8 => (550, 599, dec!(12.0)),
            CreditGrade::Grade9 => (500, 549, dec!(13.5)),
            CreditGrade::Grade10 => (0, 499, dec!(15.0)),
        }
    }

    /// band lookup; scores outside every band fall to the lowest grade
    pub fn from_score(score: u32) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|grade| {
                let (min, max, _) = grade.band();
                score >= min && score <= max
            })
            .unwrap_or(CreditGrade::Grade10)
    }

    pub fn number(&self) -> u8 {
        *self as u8 + 1
    }

    pub fn min_score(&self) -> u32 {
        self.band().0
    }

    pub fn max_score(&self) -> u32 {
        self.band().1
    }

    pub fn base_rate(&self) -> Rate {
        Rate::from_percent(self.band().2)
    }
}

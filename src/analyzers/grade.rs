use serde::Serialize;

/// Letter grade for how much of a configuration's data is usable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    #[default]
    F,
}

impl Grade {
    /// Converts a coverage proportion (0.0–1.0) into a letter grade.
    ///
    /// | Range       | Grade |
    /// |-------------|-------|
    /// | >= 0.95     | A+    |
    /// | >= 0.90     | A     |
    /// | >= 0.75     | B     |
    /// | >= 0.50     | C     |
    /// | >= 0.25     | D     |
    /// | < 0.25      | F     |
    pub fn from_coverage(p: f64) -> Grade {
        match p {
            p if p >= 0.95 => Grade::APlus,
            p if p >= 0.90 => Grade::A,
            p if p >= 0.75 => Grade::B,
            p if p >= 0.50 => Grade::C,
            p if p >= 0.25 => Grade::D,
            _ => Grade::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

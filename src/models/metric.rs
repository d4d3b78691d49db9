use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentType {
    Industry,
    Experience,
}

impl SegmentType {
    pub fn as_str(self) -> &'static str {
        match self {
            SegmentType::Industry => "industry",
            SegmentType::Experience => "experience",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "industry" => Some(SegmentType::Industry),
            "experience" => Some(SegmentType::Experience),
            _ => None,
        }
    }
}

/// Grouping a metric row is computed over.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    Industry(String),
    Experience(i32),
}

impl Segment {
    pub fn segment_type(&self) -> SegmentType {
        match self {
            Segment::Industry(_) => SegmentType::Industry,
            Segment::Experience(_) => SegmentType::Experience,
        }
    }

    pub fn key(&self) -> String {
        match self {
            Segment::Industry(industry) => industry.clone(),
            Segment::Experience(years) => years.to_string(),
        }
    }

    pub fn from_parts(segment_type: SegmentType, key: &str) -> Option<Self> {
        match segment_type {
            SegmentType::Industry => Some(Segment::Industry(key.to_string())),
            SegmentType::Experience => key.parse().ok().map(Segment::Experience),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Industry(industry) => write!(f, "{}", industry),
            Segment::Experience(years) => write!(f, "[ALL] {} Years of Experience", years),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Metric {
    pub segment_type: SegmentType,
    pub segment_key: String,
    pub label: String,
    pub average_age: Option<f64>,
    pub average_salary: Option<f64>,
    pub gender_diversity_index: Option<f64>,
    pub male_percentage: Option<f64>,
    pub female_percentage: Option<f64>,
}

impl Metric {
    pub fn empty(segment: &Segment) -> Self {
        Metric {
            segment_type: segment.segment_type(),
            segment_key: segment.key(),
            label: segment.to_string(),
            average_age: None,
            average_salary: None,
            gender_diversity_index: None,
            male_percentage: None,
            female_percentage: None,
        }
    }

    pub fn apply(&mut self, update: &MetricUpdate) {
        if let Some(value) = update.average_age {
            self.average_age = Some(value);
        }
        if let Some(value) = update.average_salary {
            self.average_salary = Some(value);
        }
        if let Some(value) = update.gender_diversity_index {
            self.gender_diversity_index = Some(value);
        }
        if let Some(value) = update.male_percentage {
            self.male_percentage = Some(value);
        }
        if let Some(value) = update.female_percentage {
            self.female_percentage = Some(value);
        }
    }
}

/// Fields written by one computation; `None` leaves the stored value alone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetricUpdate {
    pub average_age: Option<f64>,
    pub average_salary: Option<f64>,
    pub gender_diversity_index: Option<f64>,
    pub male_percentage: Option<f64>,
    pub female_percentage: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experience_segment_label() {
        let segment = Segment::Experience(5);
        assert_eq!(segment.to_string(), "[ALL] 5 Years of Experience");
        assert_eq!(segment.key(), "5");
        assert_eq!(
            Segment::from_parts(SegmentType::Experience, "5"),
            Some(Segment::Experience(5))
        );
    }

    #[test]
    fn apply_only_touches_given_fields() {
        let segment = Segment::Industry("Technology".into());
        let mut metric = Metric::empty(&segment);
        metric.apply(&MetricUpdate {
            gender_diversity_index: Some(0.5),
            male_percentage: Some(50.0),
            female_percentage: Some(50.0),
            ..Default::default()
        });
        metric.apply(&MetricUpdate {
            average_salary: Some(150.0),
            ..Default::default()
        });
        assert_eq!(metric.average_salary, Some(150.0));
        assert_eq!(metric.gender_diversity_index, Some(0.5));
        assert_eq!(metric.male_percentage, Some(50.0));
        assert_eq!(metric.average_age, None);
    }
}

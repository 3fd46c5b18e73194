//! Technical presentation scoring: six graded categories averaged into a
//! single mark and classified on a five-level scale.

use serde::{Deserialize, Serialize};

/// Category marks for one technical presentation, each graded 0-10.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PresentationScores {
    /// Staying within the allotted time
    pub time_management: f64,
    /// Delivery and speaking
    pub presentation_skill: f64,
    /// Slide content preparation
    pub slide_preparation: f64,
    /// How thoroughly the topic was covered
    pub topic_coverage: f64,
    /// Progress shown since the previous presentation
    pub progress: f64,
    /// Visual slide design
    pub slide_design: f64,
}

impl PresentationScores {
    /// Mean of the six category marks, rounded to one decimal place.
    pub fn average(&self) -> f64 {
        let sum = self.time_management
            + self.presentation_skill
            + self.slide_preparation
            + self.topic_coverage
            + self.progress
            + self.slide_design;
        (sum / 6.0 * 10.0).round() / 10.0
    }

    /// Level classification of the average mark.
    pub fn level(&self) -> PresentationLevel {
        PresentationLevel::from_average(self.average())
    }
}

/// Five-level classification of a presentation average.
///
/// The average is scaled to a percentage of the 10-point maximum and
/// classified at inclusive lower bounds of 90, 75, 60, and 40 percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresentationLevel {
    /// >= 90%
    Excellent,
    /// >= 75%
    Good,
    /// >= 60%
    Average,
    /// >= 40%
    Weak,
    /// < 40%
    VeryWeak,
}

impl PresentationLevel {
    /// Classify an average mark on the 10-point scale.
    pub fn from_average(average: f64) -> Self {
        let percentage = average / 10.0 * 100.0;
        if percentage >= 90.0 {
            PresentationLevel::Excellent
        } else if percentage >= 75.0 {
            PresentationLevel::Good
        } else if percentage >= 60.0 {
            PresentationLevel::Average
        } else if percentage >= 40.0 {
            PresentationLevel::Weak
        } else {
            PresentationLevel::VeryWeak
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            PresentationLevel::Excellent => "Excellent",
            PresentationLevel::Good => "Good",
            PresentationLevel::Average => "Average",
            PresentationLevel::Weak => "Weak",
            PresentationLevel::VeryWeak => "Very weak",
        }
    }

    /// CSS class used by the presentation badges.
    pub fn css_class(&self) -> &'static str {
        match self {
            PresentationLevel::Excellent => "excellent",
            PresentationLevel::Good => "good",
            PresentationLevel::Average => "average",
            PresentationLevel::Weak => "weak",
            PresentationLevel::VeryWeak => "very-weak",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(mark: f64) -> PresentationScores {
        PresentationScores {
            time_management: mark,
            presentation_skill: mark,
            slide_preparation: mark,
            topic_coverage: mark,
            progress: mark,
            slide_design: mark,
        }
    }

    #[test]
    fn test_average_rounds_to_one_decimal() {
        let scores = PresentationScores {
            time_management: 8.0,
            presentation_skill: 7.0,
            slide_preparation: 9.0,
            topic_coverage: 6.0,
            progress: 8.0,
            slide_design: 7.0,
        };
        // 45 / 6 = 7.5
        assert_eq!(scores.average(), 7.5);

        let scores = PresentationScores {
            progress: 9.0,
            ..uniform(8.0)
        };
        // 49 / 6 = 8.1666...
        assert_eq!(scores.average(), 8.2);
    }

    #[test]
    fn test_level_boundaries_are_inclusive_lower_bounds() {
        assert_eq!(PresentationLevel::from_average(9.0), PresentationLevel::Excellent);
        assert_eq!(PresentationLevel::from_average(8.9), PresentationLevel::Good);
        assert_eq!(PresentationLevel::from_average(7.5), PresentationLevel::Good);
        assert_eq!(PresentationLevel::from_average(7.4), PresentationLevel::Average);
        assert_eq!(PresentationLevel::from_average(6.0), PresentationLevel::Average);
        assert_eq!(PresentationLevel::from_average(4.0), PresentationLevel::Weak);
        assert_eq!(PresentationLevel::from_average(3.9), PresentationLevel::VeryWeak);
    }

    #[test]
    fn test_scores_classify_through_average() {
        assert_eq!(uniform(9.5).level(), PresentationLevel::Excellent);
        assert_eq!(uniform(5.0).level(), PresentationLevel::Weak);
        assert_eq!(uniform(5.0).level().label(), "Weak");
    }
}

mod alert;
pub use alert::{AlertStatus, AttritionAlert, RiskLevel};

mod flag;
pub use flag::FeatureFlag;

mod survey;
pub use survey::{EnpsBand, Survey, SurveyStatus};

mod competency;
pub use competency::Competency;

pub mod job;
pub mod loaders;
pub mod profile;
pub mod question;

pub use job::{normalize_url, JobSummary, SkipReason};
pub use loaders::{load_profile, load_toml};
pub use profile::{
    Blacklist, Checkboxes, EducationEntry, Experience, MonthYear, PacingMode, Profile,
    SearchTarget, WorkEntry,
};
pub use question::{ControlKind, FieldValue, Question, WizardField};

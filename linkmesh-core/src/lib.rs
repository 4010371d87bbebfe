pub mod analysis;
pub mod config;
pub mod diagnostics;
pub mod eligibility;
pub mod error;
pub mod filter;
pub mod links;
pub mod model;
pub mod normalize;
pub mod opportunity;
pub mod priority;
pub mod report;
pub mod similarity;
pub mod stats;
pub mod tokenize;

pub use analysis::{
    Analysis, AnalysisInput, AnalysisOptions, AnalysisProgressCallback, CancellationToken, Stage,
    run_analysis,
};
pub use config::AnalysisConfig;
pub use diagnostics::{DegenerateInput, RunDiagnostics, SimilarityScope};
pub use error::{EngineError, Result};
pub use filter::{OpportunityFilter, PriorityFilter};
pub use model::{Indexability, LinkEdge, Page, Performance};
pub use opportunity::{Opportunity, OpportunityList};
pub use priority::{PriorityEntry, PriorityRanking};
pub use report::{ReportData, ReportFormat, ReportOptions};
pub use similarity::SimilarityMatrix;
pub use stats::SiteStatistics;

use super::Diagnostic;
use super::config::AnalyzerConfig;
use super::elements::SourceFile;
use super::project::ProjectContext;

pub mod constant;
pub mod description;
pub mod helpers;
pub mod iterator_item_type;
pub mod method;
pub mod property;

#[cfg(test)]
pub mod test_utils;

pub use constant::ConstantRule;
pub use description::DescriptionRule;
pub use iterator_item_type::IteratorItemTypeRule;
pub use method::MethodRule;
pub use property::PropertyRule;

pub trait DiagnosticRule: Send + Sync {
    fn name(&self) -> &str;
    fn run(&self, file: &SourceFile, context: &ProjectContext) -> Vec<Diagnostic>;
}

/// Every rule, configured from `config`. Disabled rules are filtered by the
/// analyzer, not here.
pub fn all(config: &AnalyzerConfig) -> Vec<Box<dyn DiagnosticRule>> {
    vec![
        Box::new(MethodRule::new(config.method.clone(), config.use_reflection)),
        Box::new(PropertyRule::new()),
        Box::new(ConstantRule::new()),
        Box::new(DescriptionRule::new(config.description.clone())),
        Box::new(IteratorItemTypeRule::new(config.iterator.report_type)),
    ]
}

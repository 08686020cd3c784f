//! Shared services handed to every rule creator

use crate::config::EvaluationConfig;
use crate::resolver::FunctionInputResolver;
use std::sync::Arc;
use trialmatch_doid::DoidModel;

/// Ontology, input resolver and settings available while building evaluators
#[derive(Clone)]
pub struct RuleContext {
    doid_model: Arc<DoidModel>,
    resolver: Arc<FunctionInputResolver>,
    config: Arc<EvaluationConfig>,
}

impl RuleContext {
    pub fn new(doid_model: Arc<DoidModel>, config: EvaluationConfig) -> Self {
        let resolver = Arc::new(FunctionInputResolver::new(Arc::clone(&doid_model)));
        Self {
            doid_model,
            resolver,
            config: Arc::new(config),
        }
    }

    pub fn with_resolver(mut self, resolver: FunctionInputResolver) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn doid_model(&self) -> &Arc<DoidModel> {
        &self.doid_model
    }

    pub fn resolver(&self) -> &FunctionInputResolver {
        &self.resolver
    }

    pub fn config(&self) -> &Arc<EvaluationConfig> {
        &self.config
    }
}

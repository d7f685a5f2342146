use crate::config::EngineConfig;
use crate::core::context::Context;
use crate::core::types::{PredictionResult, SymptomToken};
use crate::error::{DiagnosisError, DiagnosisResult};
use crate::loader::build_context;
use crate::persistence::{load_snapshot, save_snapshot};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// Lifecycle of the engine's context. `Failed` is terminal.
#[derive(Debug, Clone)]
pub enum LoadState {
    Unloaded,
    Loading,
    Ready(Arc<Context>),
    Failed(String),
}

/// Payload-free view of [`LoadState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

// The engine owns the context lifecycle. Once Ready, predictions only take a
// read lock long enough to clone the Arc; inference itself runs lock-free.
pub struct DiagnosisEngine {
    state: RwLock<LoadState>,
}

impl Default for DiagnosisEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosisEngine {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LoadState::Unloaded),
        }
    }

    /// An engine already in `Ready` around a prebuilt context.
    pub fn with_context(context: Context) -> Self {
        Self {
            state: RwLock::new(LoadState::Ready(Arc::new(context))),
        }
    }

    pub fn status(&self) -> Status {
        match self.state.read() {
            Ok(state) => match &*state {
                LoadState::Unloaded => Status::Unloaded,
                LoadState::Loading => Status::Loading,
                LoadState::Ready(_) => Status::Ready,
                LoadState::Failed(_) => Status::Failed,
            },
            Err(_) => Status::Failed,
        }
    }

    /// Runs `build` as the one load phase: `Unloaded -> Loading -> Ready | Failed`.
    pub fn load_with<F>(&self, build: F) -> DiagnosisResult<Arc<Context>>
    where
        F: FnOnce() -> DiagnosisResult<Context>,
    {
        {
            let mut state = self.write_state()?;
            match &*state {
                LoadState::Unloaded => {}
                LoadState::Loading => return Err(DiagnosisError::init("load already in progress")),
                LoadState::Ready(_) => return Err(DiagnosisError::init("context already loaded")),
                LoadState::Failed(reason) => {
                    return Err(DiagnosisError::init(format!("earlier load failed: {reason}")))
                }
            }
            *state = LoadState::Loading;
        }
        log::info!("Loading diagnosis context");

        let mut pending = PendingLoad {
            state: &self.state,
            armed: true,
        };
        let outcome = build();
        pending.armed = false;
        let mut state = self.write_state()?;
        match outcome {
            Ok(context) => {
                let context = Arc::new(context);
                *state = LoadState::Ready(Arc::clone(&context));
                log::info!("Diagnosis engine ready ({})", context.strategy().name());
                Ok(context)
            }
            Err(e) => {
                log::error!("Diagnosis context failed to load: {}", e);
                *state = LoadState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    pub fn load(&self, config: &EngineConfig) -> DiagnosisResult<Arc<Context>> {
        self.load_with(|| build_context(config))
    }

    pub fn load_snapshot(&self, path: &Path) -> DiagnosisResult<Arc<Context>> {
        self.load_with(|| load_snapshot(path))
    }

    /// Loads from the snapshot when it is readable; otherwise builds from the
    /// config and writes a fresh snapshot for the next start.
    pub fn load_cached(
        &self,
        config: &EngineConfig,
        snapshot: &Path,
    ) -> DiagnosisResult<Arc<Context>> {
        self.load_with(|| match load_snapshot(snapshot) {
            Ok(context) => {
                log::info!("Loaded context snapshot {}", snapshot.display());
                Ok(context)
            }
            Err(e) => {
                log::debug!("Snapshot unavailable ({}), building from artifacts", e);
                let context = build_context(config)?;
                if let Err(e) = save_snapshot(&context, snapshot) {
                    log::warn!("Could not write snapshot {}: {}", snapshot.display(), e);
                }
                Ok(context)
            }
        })
    }

    /// The ready context, or `Initialization` in any other state.
    pub fn context(&self) -> DiagnosisResult<Arc<Context>> {
        let state = self
            .state
            .read()
            .map_err(|_| DiagnosisError::init("engine state lock poisoned"))?;
        match &*state {
            LoadState::Ready(context) => Ok(Arc::clone(context)),
            LoadState::Unloaded => Err(DiagnosisError::init("context not loaded")),
            LoadState::Loading => Err(DiagnosisError::init("context still loading")),
            LoadState::Failed(reason) => Err(DiagnosisError::init(format!("load failed: {reason}"))),
        }
    }

    pub fn predict<S: AsRef<str>>(&self, symptoms: &[S]) -> DiagnosisResult<PredictionResult> {
        self.context()?.predict(symptoms)
    }

    pub fn list_vocabulary(&self) -> DiagnosisResult<BTreeMap<SymptomToken, String>> {
        Ok(self.context()?.list_vocabulary())
    }

    fn write_state(&self) -> DiagnosisResult<std::sync::RwLockWriteGuard<'_, LoadState>> {
        self.state
            .write()
            .map_err(|_| DiagnosisError::init("engine state lock poisoned"))
    }
}

/// Marks the state `Failed` if the build unwinds before it is disarmed.
struct PendingLoad<'a> {
    state: &'a RwLock<LoadState>,
    armed: bool,
}

impl Drop for PendingLoad<'_> {
    fn drop(&mut self) {
        if self.armed {
            log::error!("Diagnosis context build panicked");
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            *state = LoadState::Failed("load panicked".into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{DiseaseCatalog, DiseaseEntry};
    use crate::core::labels::LabelMap;
    use crate::core::vocabulary::FeatureVocabulary;
    use crate::strategy::InferenceStrategy;

    fn context() -> Context {
        let catalog = DiseaseCatalog::new(vec![DiseaseEntry {
            name: "Flu".into(),
            symptoms: ["fever", "cough"].iter().map(|s| s.to_string()).collect(),
            description: "Influenza".into(),
        }]);
        let vocab = FeatureVocabulary::from_observed(catalog.all_symptoms());
        Context::new(vocab, catalog, LabelMap::default(), InferenceStrategy::Similarity).unwrap()
    }

    #[test]
    fn unloaded_engine_refuses_predictions() {
        let engine = DiagnosisEngine::new();
        assert_eq!(engine.status(), Status::Unloaded);
        let err = engine.predict(&["fever"]).unwrap_err();
        assert_eq!(err.kind(), "initialization");
        assert!(engine.list_vocabulary().is_err());
    }

    #[test]
    fn successful_load_becomes_ready() {
        let engine = DiagnosisEngine::new();
        engine.load_with(|| Ok(context())).unwrap();
        assert_eq!(engine.status(), Status::Ready);
        assert_eq!(engine.predict(&["fever"]).unwrap().disease, "Flu");
        assert_eq!(engine.list_vocabulary().unwrap().len(), 2);
    }

    #[test]
    fn failed_load_is_permanent() {
        let engine = DiagnosisEngine::new();
        assert!(engine.load_with(|| Err(DiagnosisError::init("boom"))).is_err());
        assert_eq!(engine.status(), Status::Failed);
        assert!(engine.load_with(|| Ok(context())).is_err());
        assert_eq!(engine.status(), Status::Failed);
        let err = engine.predict(&["fever"]).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn panicking_build_leaves_engine_failed() {
        let engine = DiagnosisEngine::new();
        let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            engine.load_with(|| -> DiagnosisResult<Context> { panic!("artifact parser bug") })
        }));
        assert!(unwound.is_err());
        assert_eq!(engine.status(), Status::Failed);
        assert!(engine.load_with(|| Ok(context())).is_err());
        let err = engine.predict(&["fever"]).unwrap_err();
        assert!(err.to_string().contains("load panicked"));
    }

    #[test]
    fn second_load_is_rejected() {
        let engine = DiagnosisEngine::with_context(context());
        assert!(engine.load_with(|| Ok(context())).is_err());
        assert_eq!(engine.status(), Status::Ready);
    }

    #[test]
    fn predictions_run_concurrently() {
        let engine = Arc::new(DiagnosisEngine::with_context(context()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || engine.predict(&["cough"]).map(|r| r.disease))
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap().unwrap(), "Flu");
        }
    }
}

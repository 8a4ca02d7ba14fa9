//! Plan generation barrier.
//!
//! Slide contents are written independently (typically by a remote model),
//! but a deck is only built from a complete plan. [`collect_plan`] runs one
//! writer task per outline entry, at most `concurrency` at a time, and
//! returns every slide in outline order or the first failure. Remaining
//! tasks are aborted on failure, so no partial plan ever leaves this module.

use crate::ooxml::pptx::plan::{ContentPlan, Replacements, SlideInstance};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Writer tasks allowed in flight when no limit is given.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// One slide to write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    #[serde(alias = "type")]
    pub slide_type: String,
    /// Free-form instructions for the writer
    #[serde(default)]
    pub brief: String,
}

impl OutlineEntry {
    pub fn new(slide_type: impl Into<String>, brief: impl Into<String>) -> Self {
        Self {
            slide_type: slide_type.into(),
            brief: brief.into(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("writing slide {index} ({slide_type}) failed: {reason}")]
    Slide {
        index: usize,
        slide_type: String,
        reason: String,
    },

    #[error("slide writer task failed: {0}")]
    Task(String),

    #[error("slide {0} was never written")]
    Missing(usize),
}

/// Write every outline entry and collect the results into one plan.
///
/// `write` receives the entry's position and the entry, and returns the
/// slide's replacements. The plan keeps outline order whatever order the
/// writers finish in.
pub async fn collect_plan<F, Fut, E>(
    outline: Vec<OutlineEntry>,
    concurrency: usize,
    write: F,
) -> Result<ContentPlan, GenerationError>
where
    F: Fn(usize, OutlineEntry) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Replacements, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let total = outline.len();
    let concurrency = concurrency.max(1);
    tracing::debug!(slides = total, concurrency, "collecting plan");

    let permits = Arc::new(Semaphore::new(concurrency));
    let write = Arc::new(write);
    let mut tasks = JoinSet::new();

    for (index, entry) in outline.into_iter().enumerate() {
        let permits = Arc::clone(&permits);
        let write = Arc::clone(&write);
        tasks.spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| GenerationError::Task(e.to_string()))?;
            let slide_type = entry.slide_type.clone();
            let replacements = write(index, entry).await.map_err(|e| GenerationError::Slide {
                index,
                slide_type: slide_type.clone(),
                reason: e.to_string(),
            })?;
            Ok::<_, GenerationError>((index, SlideInstance {
                slide_type,
                replacements,
            }))
        });
    }

    let mut slides: Vec<Option<SlideInstance>> = vec![None; total];
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined
            .map_err(|e| GenerationError::Task(e.to_string()))
            .and_then(|written| written);
        match outcome {
            Ok((index, slide)) => {
                tracing::trace!(index, slide_type = %slide.slide_type, "slide written");
                slides[index] = Some(slide);
            },
            Err(err) => {
                tasks.abort_all();
                tracing::debug!(error = %err, "plan generation aborted");
                return Err(err);
            },
        }
    }

    let slides = slides
        .into_iter()
        .enumerate()
        .map(|(index, slide)| slide.ok_or(GenerationError::Missing(index)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ContentPlan::new(slides))
}

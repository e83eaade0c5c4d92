use crate::config::ChartConfig;
use crate::ir::{Entity, PreparedEntity};
use crate::layout::{BubbleLayout, Encoding, LayoutError, compute_layout};
use crate::metadata::{LookupError, MetadataLookup, profile_field};

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// One configured chart. Holds no state between draws.
pub struct BubbleChart<'a> {
    config: ChartConfig,
    lookup: Option<&'a dyn MetadataLookup>,
}

impl<'a> BubbleChart<'a> {
    pub fn new(config: ChartConfig) -> Self {
        Self {
            config,
            lookup: None,
        }
    }

    pub fn with_lookup(mut self, lookup: &'a dyn MetadataLookup) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    /// Derive ratio metrics and resolve each record's group.
    ///
    /// A string attribute named like `yMetric` on the record wins over the
    /// metadata lookup. Unknown country codes fail with `NotFound`.
    pub fn prepare(&self, entities: &[Entity]) -> Result<Vec<PreparedEntity>, ChartError> {
        let field = self.config.y_metric.as_str();
        let mut prepared = Vec::with_capacity(entities.len());
        for entity in entities {
            let group = match (entity.attribute(field), self.lookup) {
                (Some(inline), _) => Some(inline.to_string()),
                (None, Some(lookup)) => {
                    let profile = lookup.lookup(&entity.key)?;
                    profile_field(&profile, field).map(str::to_string)
                }
                (None, None) => None,
            };
            prepared.push(PreparedEntity::from_entity(
                entity,
                &self.config.derived,
                group,
            ));
        }
        Ok(prepared)
    }

    pub fn encoding(&self) -> Encoding<'_, PreparedEntity> {
        Encoding::named(&self.config.r_metric, &self.config.x_metric)
    }

    pub fn layout(&self, prepared: &[PreparedEntity]) -> Result<BubbleLayout, LayoutError> {
        compute_layout(prepared, &self.encoding(), &self.config.layout_config())
    }

    pub fn draw(&self, entities: &[Entity]) -> Result<BubbleLayout, ChartError> {
        let prepared = self.prepare(entities)?;
        Ok(self.layout(&prepared)?)
    }

    /// Drop prepared records the layout could not place.
    pub fn filter_complete(&self, prepared: Vec<PreparedEntity>) -> Vec<PreparedEntity> {
        let before = prepared.len();
        let kept: Vec<PreparedEntity> = prepared
            .into_iter()
            .filter(|entity| {
                entity.group.is_some()
                    && entity.metric(&self.config.r_metric).is_some()
                    && entity.metric(&self.config.x_metric).is_some()
            })
            .collect();
        if kept.len() < before {
            log::info!("dropped {} incomplete records", before - kept.len());
        }
        kept
    }
}

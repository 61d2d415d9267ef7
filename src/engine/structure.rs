//! Table structure recognition: recover a table's grid from its cropped image.
//!
//! The structure model runs behind a serving endpoint, same contract shape
//! as the layout model. Request: `POST {endpoint}` with
//! `{"image": "<base64 PNG>"}`. Response:
//! `{"html": "<table>…</table>", "cells": [[x0, y0, x1, y1, …], …]}` where
//! `html` is the empty row/column skeleton and each `cells` entry is a flat
//! list of coordinate samples for one cell, in table-local pixels, in the
//! same document order as the skeleton's `<td>` nodes.

use super::layout::encode_png_base64;
use super::EngineError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Coordinate samples of one detected cell, table-local.
///
/// The model may emit 4 values (a box) or 8 (a quadrilateral); consumers
/// take the min/max of the x and y samples, so both work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellBox {
    pub points: Vec<f32>,
}

impl CellBox {
    /// `((x_min, y_min), (x_max, y_max))` over the coordinate samples, or
    /// `None` when there are fewer than two samples.
    pub fn bounds(&self) -> Option<((f32, f32), (f32, f32))> {
        let xs: Vec<f32> = self.points.iter().copied().step_by(2).collect();
        let ys: Vec<f32> = self.points.iter().copied().skip(1).step_by(2).collect();
        if xs.is_empty() || ys.is_empty() {
            return None;
        }
        let fold = |v: &[f32]| {
            v.iter()
                .fold((f32::MAX, f32::MIN), |(lo, hi), &x| (lo.min(x), hi.max(x)))
        };
        let (x_min, x_max) = fold(&xs);
        let (y_min, y_max) = fold(&ys);
        Some(((x_min, y_min), (x_max, y_max)))
    }
}

/// The recovered grid of one table.
#[derive(Debug, Clone, Deserialize)]
pub struct TableStructure {
    /// HTML skeleton with empty cells.
    pub html: String,
    /// One box per cell, in `<td>` document order.
    pub cells: Vec<CellBox>,
}

/// Recovers row/column structure and cell boxes from a table crop.
pub trait StructureRecognizer: Send + Sync {
    fn recognize(&self, table_image: &DynamicImage) -> Result<TableStructure, EngineError>;
}

#[derive(Serialize)]
struct RecognizeRequest {
    image: String,
}

/// Client of a table-structure serving endpoint.
pub struct HttpStructureRecognizer {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpStructureRecognizer {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| reqwest::blocking::Client::new()),
        }
    }
}

impl StructureRecognizer for HttpStructureRecognizer {
    fn recognize(&self, table_image: &DynamicImage) -> Result<TableStructure, EngineError> {
        let request = RecognizeRequest {
            image: encode_png_base64(table_image)?,
        };
        let structure: TableStructure = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| EngineError::Backend(format!("structure endpoint: {e}")))?
            .error_for_status()
            .map_err(|e| EngineError::Backend(format!("structure endpoint: {e}")))?
            .json()
            .map_err(|e| EngineError::Backend(format!("structure response: {e}")))?;

        debug!("Structure model returned {} cells", structure.cells.len());
        Ok(structure)
    }
}

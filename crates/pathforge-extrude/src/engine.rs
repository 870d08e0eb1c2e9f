//! Parallel extrusion engine.
//!
//! The template's lateral extent is cut into bands of `section_width`
//! columns. Each band is an independent unit of work on a bounded `rayon`
//! pool; a unit that panics is isolated and contributes nothing. Unit
//! results are tagged with their section index and reassembled in that
//! order, so output is identical for any pool size.
//!
//! Within a section the generation order is: path sample, then lateral
//! column (left to right), then vertical level (bottom to top).

use crate::slab::smooth_slab;
use crate::template::Template;
use pathforge_core::{BlockPos, BlockState, ExtrusionError, PlacementInstruction};
use pathforge_route::PathSample;
use rayon::prelude::*;
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::panic::{self, AssertUnwindSafe};

/// Extrusion tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrusionOptions {
    /// Worker threads; `None` uses the available parallelism.
    pub worker_threads: Option<usize>,
    /// Lateral columns per section.
    pub section_width: usize,
    /// Re-derive slab types on open surfaces.
    pub smooth_slabs: bool,
    /// Keep only the first instruction per block position.
    pub dedupe_positions: bool,
}

impl Default for ExtrusionOptions {
    fn default() -> Self {
        Self {
            worker_threads: None,
            section_width: 4,
            smooth_slabs: true,
            dedupe_positions: true,
        }
    }
}

/// A band of lateral columns processed as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Position of the band, left to right.
    pub index: usize,
    /// Lateral coordinates covered.
    pub columns: RangeInclusive<i32>,
}

/// Result of an extrusion run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtrusionReport {
    /// Ordered instructions.
    pub instructions: Vec<PlacementInstruction>,
    /// Number of sections dispatched.
    pub sections: usize,
    /// Sections that failed, with the failure description.
    pub failed_sections: Vec<(usize, String)>,
}

/// Sweeps templates along paths on a worker pool.
#[derive(Debug)]
pub struct ExtrusionEngine {
    options: ExtrusionOptions,
    pool: rayon::ThreadPool,
}

impl ExtrusionEngine {
    /// Creates an engine and its worker pool.
    pub fn new(options: ExtrusionOptions) -> Result<Self, ExtrusionError> {
        let threads = options.worker_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("pathforge-extrude-{i}"))
            .build()
            .map_err(|e| ExtrusionError::WorkerPool {
                reason: e.to_string(),
            })?;

        tracing::debug!(threads = pool.current_num_threads(), "extrusion pool ready");
        Ok(Self { options, pool })
    }

    /// Active options.
    pub fn options(&self) -> &ExtrusionOptions {
        &self.options
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Partition a template's lateral extent into sections.
    pub fn sections(&self, template: &Template) -> Vec<Section> {
        let range = template.lateral_range();
        let width = self.options.section_width.max(1) as i32;
        let mut sections = Vec::new();
        let mut start = *range.start();
        while start <= *range.end() {
            let end = (start + width - 1).min(*range.end());
            sections.push(Section {
                index: sections.len(),
                columns: start..=end,
            });
            start = end + 1;
        }
        sections
    }

    /// Extrude and return only the ordered instructions.
    pub fn extrude(
        &self,
        path: &[PathSample],
        template: &Template,
    ) -> Result<Vec<PlacementInstruction>, ExtrusionError> {
        self.extrude_with_report(path, template)
            .map(|report| report.instructions)
    }

    /// Extrude, also reporting section failures.
    pub fn extrude_with_report(
        &self,
        path: &[PathSample],
        template: &Template,
    ) -> Result<ExtrusionReport, ExtrusionError> {
        if path.is_empty() {
            return Err(ExtrusionError::EmptyPath);
        }
        if template.is_empty() {
            return Err(ExtrusionError::EmptyTemplate {
                name: template.name().to_string(),
            });
        }

        let sections = self.sections(template);
        let smooth = self.options.smooth_slabs;
        tracing::debug!(
            template = template.name(),
            samples = path.len(),
            sections = sections.len(),
            "extrusion started"
        );

        let mut results: Vec<(usize, Result<Vec<PlacementInstruction>, String>)> =
            self.pool.install(|| {
                sections
                    .par_iter()
                    .map(|section| {
                        let result = run_isolated(|| {
                            extrude_section(path, template, section, smooth)
                        });
                        (section.index, result)
                    })
                    .collect()
            });
        results.sort_by_key(|(index, _)| *index);

        let mut report = ExtrusionReport {
            sections: sections.len(),
            ..ExtrusionReport::default()
        };
        for (index, result) in results {
            match result {
                Ok(instructions) => report.instructions.extend(instructions),
                Err(reason) => {
                    tracing::error!(section = index, %reason, "extrusion section failed");
                    report.failed_sections.push((index, reason));
                }
            }
        }

        if self.options.dedupe_positions {
            dedupe_positions(&mut report.instructions);
        }
        tracing::debug!(
            instructions = report.instructions.len(),
            failed = report.failed_sections.len(),
            "extrusion finished"
        );
        Ok(report)
    }
}

/// Run one unit, turning a panic into a failure description.
fn run_isolated<F>(unit: F) -> Result<Vec<PlacementInstruction>, String>
where
    F: FnOnce() -> Vec<PlacementInstruction>,
{
    panic::catch_unwind(AssertUnwindSafe(unit)).map_err(|payload| {
        if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "unknown panic".to_string()
        }
    })
}

fn extrude_section(
    path: &[PathSample],
    template: &Template,
    section: &Section,
    smooth: bool,
) -> Vec<PlacementInstruction> {
    let mut out = Vec::new();
    for (step, sample) in path.iter().enumerate() {
        let slice = template.slice_for_step(step);
        let basis = sample.basis();
        for lateral in section.columns.clone() {
            for vertical in template.vertical_range() {
                let Some(state) = template.block_at(slice, lateral, vertical) else {
                    continue;
                };
                let world = basis.project(sample.position, lateral as f64, vertical as f64, 0.0);
                let mut state = orient(state, sample.yaw);
                if smooth && state.is_half_height() {
                    let above_open = template.block_at(slice, lateral, vertical + 1).is_none();
                    let below_open = template.block_at(slice, lateral, vertical - 1).is_none();
                    state = smooth_slab(&state, world.y, above_open, below_open);
                }
                out.push(PlacementInstruction::new(BlockPos::containing(world), state));
            }
        }
    }
    out
}

fn orient(state: &BlockState, yaw: f64) -> BlockState {
    match state.with_rotation(yaw) {
        Ok(rotated) => rotated,
        Err(e) => {
            tracing::warn!(%state, yaw, error = %e, "rotation failed, placing unrotated");
            state.clone()
        }
    }
}

fn dedupe_positions(instructions: &mut Vec<PlacementInstruction>) {
    let mut seen = HashSet::with_capacity(instructions.len());
    instructions.retain(|instruction| seen.insert(instruction.pos));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Slice;
    use pathforge_core::Vec3;

    fn engine(threads: usize) -> ExtrusionEngine {
        ExtrusionEngine::new(ExtrusionOptions {
            worker_threads: Some(threads),
            section_width: 2,
            ..ExtrusionOptions::default()
        })
        .unwrap()
    }

    #[test]
    fn test_sections_cover_lateral_range() {
        let template = Template::new("road", 5, 1);
        let sections = engine(1).sections(&template);
        assert_eq!(
            sections,
            vec![
                Section { index: 0, columns: -2..=-1 },
                Section { index: 1, columns: 0..=1 },
                Section { index: 2, columns: 2..=2 },
            ]
        );
    }

    #[test]
    fn test_empty_inputs_fail() {
        let template = Template::new("empty", 1, 1);
        let path = [PathSample::new(Vec3::ZERO, 0.0, 0.0)];
        assert_eq!(
            engine(1).extrude(&path, &template),
            Err(ExtrusionError::EmptyTemplate {
                name: "empty".to_string()
            })
        );

        let template = template
            .with_slice(Slice::filled(1, 1, BlockState::new("minecraft:stone")))
            .unwrap();
        assert_eq!(engine(1).extrude(&[], &template), Err(ExtrusionError::EmptyPath));
    }

    #[test]
    fn test_panicking_unit_is_isolated() {
        let result = run_isolated(|| panic!("section blew up"));
        assert_eq!(result, Err("section blew up".to_string()));

        let ok = run_isolated(Vec::new);
        assert_eq!(ok, Ok(Vec::new()));
    }

    #[test]
    fn test_rotation_follows_yaw() {
        let stairs = BlockState::parse("minecraft:oak_stairs[facing=north]").unwrap();
        let template = Template::new("stairs", 1, 1)
            .with_slice(Slice::filled(1, 1, stairs))
            .unwrap();
        let path = [PathSample::new(Vec3::new(0.5, 64.0, 0.5), 90.0, 0.0)];

        let out = engine(1).extrude(&path, &template).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].state.property("facing"), Some("east"));
    }

    #[test]
    fn test_unrotatable_state_is_placed_unrotated() {
        let odd = BlockState::parse("minecraft:oak_log[axis=w]").unwrap();
        let template = Template::new("odd", 1, 1)
            .with_slice(Slice::filled(1, 1, odd.clone()))
            .unwrap();
        let path = [PathSample::new(Vec3::ZERO, 90.0, 0.0)];

        let out = engine(1).extrude(&path, &template).unwrap();
        assert_eq!(out[0].state, odd);
    }

    #[test]
    fn test_dedupe_keeps_first_instruction() {
        let mut instructions = vec![
            PlacementInstruction::new(BlockPos::new(0, 0, 0), BlockState::new("a")),
            PlacementInstruction::new(BlockPos::new(1, 0, 0), BlockState::new("b")),
            PlacementInstruction::new(BlockPos::new(0, 0, 0), BlockState::new("c")),
        ];
        dedupe_positions(&mut instructions);
        assert_eq!(instructions.len(), 2);
        assert_eq!(instructions[0].state.name(), "a");
    }
}

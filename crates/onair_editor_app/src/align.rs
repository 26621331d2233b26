// SPDX-License-Identifier: MIT OR Apache-2.0
//! Alignment, distribution, canvas placement and nudging.
//!
//! Every helper returns one [`GeometryCommand`] covering all affected
//! objects, so each action is a single undo step. Locked objects are left
//! where they are.

use crate::commands::GeometryCommand;
use crate::config::EditorConfig;
use crate::model::{Geometry, GeometryPatch, ObjectId, SceneObject};
use serde::{Deserialize, Serialize};

/// Alignment against the first selected object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    /// Left edges
    Left,
    /// Horizontal centers
    Center,
    /// Right edges
    Right,
    /// Top edges
    Top,
    /// Vertical centers
    Middle,
    /// Bottom edges
    Bottom,
    /// Even horizontal gaps (3+ objects)
    SpaceHorizontal,
    /// Even vertical gaps (3+ objects)
    SpaceVertical,
}

impl Alignment {
    /// History description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Left => "Align left",
            Self::Center => "Align center",
            Self::Right => "Align right",
            Self::Top => "Align top",
            Self::Middle => "Align middle",
            Self::Bottom => "Align bottom",
            Self::SpaceHorizontal => "Distribute horizontally",
            Self::SpaceVertical => "Distribute vertically",
        }
    }
}

/// Placement on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    /// Center on both axes
    CenterCanvas,
    /// Center horizontally only
    CenterHorizontal,
    /// Sit on the bottom safe margin
    Bottom,
}

impl Placement {
    /// History description
    pub fn description(&self) -> &'static str {
        match self {
            Self::CenterCanvas => "Center on canvas",
            Self::CenterHorizontal => "Center horizontally",
            Self::Bottom => "Move to bottom",
        }
    }
}

/// Arrow-key direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NudgeDirection {
    /// Arrow left
    Left,
    /// Arrow right
    Right,
    /// Arrow up
    Up,
    /// Arrow down
    Down,
}

impl NudgeDirection {
    /// Unit vector in canvas space (y grows downwards)
    pub fn vector(&self) -> [f64; 2] {
        match self {
            Self::Left => [-1.0, 0.0],
            Self::Right => [1.0, 0.0],
            Self::Up => [0.0, -1.0],
            Self::Down => [0.0, 1.0],
        }
    }
}

fn movable(objects: &[&SceneObject]) -> Vec<(ObjectId, Geometry)> {
    objects
        .iter()
        .filter(|object| !object.locked)
        .map(|object| (object.id, object.geometry()))
        .collect()
}

fn command(description: &str, patches: Vec<(ObjectId, GeometryPatch)>) -> Option<GeometryCommand> {
    if patches.is_empty() {
        return None;
    }
    Some(GeometryCommand {
        description: description.to_string(),
        patches,
    })
}

/// Align `objects` (in scene order) to the first of them
pub fn align(objects: &[&SceneObject], alignment: Alignment) -> Option<GeometryCommand> {
    let items = movable(objects);
    let patches = match alignment {
        Alignment::SpaceHorizontal => distribute(&items, false),
        Alignment::SpaceVertical => distribute(&items, true),
        edge => align_edges(&items, edge),
    };
    command(alignment.description(), patches)
}

fn align_edges(items: &[(ObjectId, Geometry)], alignment: Alignment) -> Vec<(ObjectId, GeometryPatch)> {
    let Some(((_, reference), rest)) = items.split_first() else {
        return Vec::new();
    };
    rest.iter()
        .map(|(id, g)| {
            let patch = match alignment {
                Alignment::Left => GeometryPatch { x: Some(reference.x), ..Default::default() },
                Alignment::Center => GeometryPatch {
                    x: Some(reference.x + reference.width / 2.0 - g.width / 2.0),
                    ..Default::default()
                },
                Alignment::Right => GeometryPatch {
                    x: Some(reference.right() - g.width),
                    ..Default::default()
                },
                Alignment::Top => GeometryPatch { y: Some(reference.y), ..Default::default() },
                Alignment::Middle => GeometryPatch {
                    y: Some(reference.y + reference.height / 2.0 - g.height / 2.0),
                    ..Default::default()
                },
                Alignment::Bottom => GeometryPatch {
                    y: Some(reference.bottom() - g.height),
                    ..Default::default()
                },
                Alignment::SpaceHorizontal | Alignment::SpaceVertical => GeometryPatch::default(),
            };
            (*id, patch)
        })
        .collect()
}

fn distribute(items: &[(ObjectId, Geometry)], vertical: bool) -> Vec<(ObjectId, GeometryPatch)> {
    if items.len() < 3 {
        return Vec::new();
    }
    let start = |g: &Geometry| if vertical { g.y } else { g.x };
    let size = |g: &Geometry| if vertical { g.height } else { g.width };

    let mut sorted: Vec<&(ObjectId, Geometry)> = items.iter().collect();
    sorted.sort_by(|a, b| start(&a.1).total_cmp(&start(&b.1)));

    let first = start(&sorted[0].1);
    let last = sorted[sorted.len() - 1].1;
    let span = start(&last) + size(&last) - first;
    let occupied: f64 = sorted.iter().map(|(_, g)| size(g)).sum();
    let gap = (span - occupied) / (sorted.len() - 1) as f64;

    let mut cursor = first;
    sorted
        .into_iter()
        .map(|(id, g)| {
            let position = cursor;
            cursor += size(g) + gap;
            let patch = if vertical {
                GeometryPatch { y: Some(position), ..Default::default() }
            } else {
                GeometryPatch { x: Some(position), ..Default::default() }
            };
            (*id, patch)
        })
        .collect()
}

/// Place `objects` on the canvas; several objects move as one group
pub fn place(objects: &[&SceneObject], placement: Placement, config: &EditorConfig) -> Option<GeometryCommand> {
    let items = movable(objects);
    let (first, _) = items.split_first()?;
    let bounds = items.iter().skip(1).fold(first.1, |acc, (_, g)| {
        let x = acc.x.min(g.x);
        let y = acc.y.min(g.y);
        Geometry {
            x,
            y,
            width: acc.right().max(g.right()) - x,
            height: acc.bottom().max(g.bottom()) - y,
            rotation: 0.0,
        }
    });

    let dx = match placement {
        Placement::CenterCanvas | Placement::CenterHorizontal => {
            ((config.canvas_width - bounds.width) / 2.0).round() - bounds.x
        }
        Placement::Bottom => 0.0,
    };
    let dy = match placement {
        Placement::CenterCanvas => ((config.canvas_height - bounds.height) / 2.0).round() - bounds.y,
        Placement::CenterHorizontal => 0.0,
        Placement::Bottom => config.canvas_height - config.bottom_margin - bounds.bottom(),
    };

    let patches = items
        .iter()
        .map(|(id, g)| {
            let patch = match placement {
                Placement::CenterCanvas => GeometryPatch::position(g.x + dx, g.y + dy),
                Placement::CenterHorizontal => GeometryPatch { x: Some(g.x + dx), ..Default::default() },
                Placement::Bottom => GeometryPatch { y: Some(g.y + dy), ..Default::default() },
            };
            (*id, patch)
        })
        .collect();
    command(placement.description(), patches)
}

/// Move `objects` one step; `large` uses the bigger step
pub fn nudge(
    objects: &[&SceneObject],
    direction: NudgeDirection,
    large: bool,
    config: &EditorConfig,
) -> Option<GeometryCommand> {
    let step = if large { config.nudge_step_large } else { config.nudge_step };
    let [vx, vy] = direction.vector();
    let patches = movable(objects)
        .into_iter()
        .map(|(id, g)| (id, GeometryPatch::position(g.x + vx * step, g.y + vy * step)))
        .collect();
    command("Nudge", patches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ObjectKind;

    fn shape(x: f64, y: f64, width: f64, height: f64) -> SceneObject {
        SceneObject::new(ObjectKind::Shape).with_geometry(x, y, width, height)
    }

    fn patch_for(command: &GeometryCommand, id: ObjectId) -> GeometryPatch {
        command
            .patches
            .iter()
            .find(|(patched, _)| *patched == id)
            .map(|(_, patch)| *patch)
            .unwrap()
    }

    #[test]
    fn test_align_to_first_selected() {
        let a = shape(100.0, 100.0, 200.0, 100.0);
        let b = shape(500.0, 300.0, 50.0, 20.0);
        let objects = [&a, &b];

        let left = align(&objects, Alignment::Left).unwrap();
        assert_eq!(left.patches.len(), 1);
        assert_eq!(patch_for(&left, b.id).x, Some(100.0));

        let center = align(&objects, Alignment::Center).unwrap();
        assert_eq!(patch_for(&center, b.id).x, Some(175.0));

        let right = align(&objects, Alignment::Right).unwrap();
        assert_eq!(patch_for(&right, b.id).x, Some(250.0));

        let middle = align(&objects, Alignment::Middle).unwrap();
        assert_eq!(patch_for(&middle, b.id).y, Some(140.0));

        let bottom = align(&objects, Alignment::Bottom).unwrap();
        assert_eq!(patch_for(&bottom, b.id).y, Some(180.0));
        assert!(align(&[&a], Alignment::Left).is_none());
    }

    #[test]
    fn test_distribute_even_gaps() {
        let a = shape(0.0, 0.0, 100.0, 10.0);
        let b = shape(500.0, 0.0, 100.0, 10.0);
        let c = shape(120.0, 0.0, 100.0, 10.0);
        let spaced = align(&[&a, &b, &c], Alignment::SpaceHorizontal).unwrap();
        assert_eq!(patch_for(&spaced, a.id).x, Some(0.0));
        assert_eq!(patch_for(&spaced, c.id).x, Some(250.0));
        assert_eq!(patch_for(&spaced, b.id).x, Some(500.0));
        assert!(align(&[&a, &b], Alignment::SpaceVertical).is_none());
    }

    #[test]
    fn test_place_single_object() {
        let config = EditorConfig::default();
        let a = shape(3.0, 7.0, 201.0, 100.0);
        let centered = place(&[&a], Placement::CenterCanvas, &config).unwrap();
        assert_eq!(patch_for(&centered, a.id), GeometryPatch::position(860.0, 490.0));

        let bottom = place(&[&a], Placement::Bottom, &config).unwrap();
        assert_eq!(patch_for(&bottom, a.id).y, Some(960.0));
        assert_eq!(patch_for(&bottom, a.id).x, None);
    }

    #[test]
    fn test_place_group_keeps_offsets() {
        let config = EditorConfig::default();
        let a = shape(0.0, 0.0, 100.0, 100.0);
        let b = shape(200.0, 50.0, 100.0, 100.0);
        let centered = place(&[&a, &b], Placement::CenterHorizontal, &config).unwrap();
        let pa = patch_for(&centered, a.id);
        let pb = patch_for(&centered, b.id);
        assert_eq!(pa.x, Some(810.0));
        assert_eq!(pb.x, Some(1010.0));
        assert_eq!(pa.y, None);
    }

    #[test]
    fn test_nudge_steps_and_locked() {
        let config = EditorConfig::default();
        let a = shape(10.0, 10.0, 50.0, 50.0);
        let mut locked = shape(0.0, 0.0, 50.0, 50.0);
        locked.locked = true;

        let small = nudge(&[&a, &locked], NudgeDirection::Left, false, &config).unwrap();
        assert_eq!(small.patches.len(), 1);
        assert_eq!(patch_for(&small, a.id), GeometryPatch::position(9.0, 10.0));

        let large = nudge(&[&a], NudgeDirection::Down, true, &config).unwrap();
        assert_eq!(patch_for(&large, a.id), GeometryPatch::position(10.0, 20.0));
        assert!(nudge(&[&locked], NudgeDirection::Up, false, &config).is_none());
    }
}

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Input events delivered by the display and the keyboard map.

use crate::grid::ZoomDirection;

/// Pointer positions are grid pixels: the display maps its window
/// coordinates onto the composed grid image before sending them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerMoved { x: f64, y: f64 },
    Click { x: f64, y: f64 },
    Scroll { x: f64, y: f64, direction: ZoomDirection },
    Key(KeyCode),
    CloseRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Char(char),
    Space,
    Escape,
}

/// Everything a key can ask the viewer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerCommand {
    Close,
    TogglePlayback,
    ResetZoom,
    StepFrames(i64),
    JumpToLabeledFrame { reverse: bool },
    MoveActivePoint(i32),
    Zoom(ZoomDirection),
    Pan { dx: i32, dy: i32 },
    ClearActivePoint,
    CopyMachineLabels,
    ToggleHelp,
    ToggleAutoNextPoint,
    ToggleMachineLabels,
    TogglePointNames,
    ToggleLabelList,
    ChangeBrightness { increase: bool },
    ChangeContrast { increase: bool },
    ResetAdjustments,
}

pub fn command_for_key(key: KeyCode) -> Option<ViewerCommand> {
    use ViewerCommand::*;
    let command = match key {
        KeyCode::Escape => Close,
        KeyCode::Space => TogglePlayback,
        KeyCode::Char(ch) => match ch {
            'r' => ResetZoom,
            'a' => StepFrames(-1),
            'd' => StepFrames(1),
            'f' => JumpToLabeledFrame { reverse: true },
            'g' => JumpToLabeledFrame { reverse: false },
            'w' => MoveActivePoint(-1),
            's' => MoveActivePoint(1),
            'q' => Zoom(ZoomDirection::Out),
            'e' => Zoom(ZoomDirection::In),
            'h' => ToggleHelp,
            'u' => ClearActivePoint,
            'c' => ToggleAutoNextPoint,
            'v' => CopyMachineLabels,
            'm' => ToggleMachineLabels,
            'n' => TogglePointNames,
            ',' => ToggleLabelList,
            '1' => ChangeBrightness { increase: false },
            '2' => ChangeBrightness { increase: true },
            '3' => ChangeContrast { increase: false },
            '4' => ChangeContrast { increase: true },
            '5' => ResetAdjustments,
            'i' => Pan { dx: 0, dy: -1 },
            'k' => Pan { dx: 0, dy: 1 },
            'j' => Pan { dx: -1, dy: 0 },
            'l' => Pan { dx: 1, dy: 0 },
            ' ' => TogglePlayback,
            _ => return None,
        },
    };
    Some(command)
}

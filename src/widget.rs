//! The upload widget as an explicit state machine.
//!
//! All four display fields live in one immutable [`WidgetState`] record
//! that is replaced wholesale by [`WidgetState::apply`]. Transitions are
//! pure, so every user gesture and network outcome can be exercised
//! without a rendering environment or a server. The side-effectful part
//! of an upload lives in [`crate::uploader`]; a driver (see the
//! `widget-demo` binary) applies events and starts transfers whenever a
//! click leaves the state reporting an upload in progress.

use crate::uploader::{SelectedFile, UploadOutcome};

const MSG_SELECT_FIRST: &str = "please select a file first.";
const MSG_UPLOADING: &str = "uploading...";
const MSG_NETWORK_ERROR: &str = "upload failed: network error or no response from the server.";
const MSG_PROCESSED: &str = "file processed";

/// Substrings that classify a status as an error for display styling.
const ERROR_MARKERS: [&str; 2] = ["failed", "error"];

/// Styling bucket for the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Success,
    Error,
}

/// Widget-local display state. Empty status and zero progress mean idle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetState {
    pub selected_file: Option<SelectedFile>,
    pub is_dragging: bool,
    pub upload_status: String,
    pub upload_progress: u8,
}

/// Everything that can happen to the widget, user gestures and upload
/// lifecycle alike.
#[derive(Debug, Clone)]
pub enum WidgetEvent {
    /// A drag gesture entered the drop zone.
    DragEnter,
    /// The drag gesture left without dropping.
    DragLeave,
    /// Files were released over the drop zone. Only the first is kept.
    Dropped(Vec<SelectedFile>),
    /// Files were chosen through the native picker. Only the first is kept.
    Picked(Vec<SelectedFile>),
    /// The user pressed the upload button.
    UploadClicked,
    /// The in-flight transfer advanced to the given percentage.
    Progress(u8),
    /// The in-flight transfer ended.
    Finished(UploadOutcome),
}

impl WidgetState {
    /// Applies one event, consuming the old state and producing the next.
    pub fn apply(self, event: WidgetEvent) -> Self {
        match event {
            WidgetEvent::DragEnter => Self { is_dragging: true, ..self },
            WidgetEvent::DragLeave => Self { is_dragging: false, ..self },
            WidgetEvent::Dropped(files) => Self {
                is_dragging: false,
                upload_status: String::new(),
                upload_progress: 0,
                selected_file: files.into_iter().next().or(self.selected_file),
            },
            WidgetEvent::Picked(files) => Self {
                is_dragging: self.is_dragging,
                upload_status: String::new(),
                upload_progress: 0,
                selected_file: files.into_iter().next().or(self.selected_file),
            },
            WidgetEvent::UploadClicked => {
                if self.selected_file.is_none() {
                    Self { upload_status: MSG_SELECT_FIRST.to_string(), ..self }
                } else {
                    Self {
                        upload_status: MSG_UPLOADING.to_string(),
                        upload_progress: 0,
                        ..self
                    }
                }
            }
            WidgetEvent::Progress(pct) => Self { upload_progress: pct, ..self },
            WidgetEvent::Finished(outcome) => self.finish(outcome),
        }
    }

    fn finish(self, outcome: UploadOutcome) -> Self {
        match outcome {
            UploadOutcome::Completed { message } => Self {
                upload_status: format!(
                    "upload succeeded: {}",
                    message.unwrap_or_else(|| MSG_PROCESSED.to_string())
                ),
                selected_file: None,
                ..self
            },
            // the selection stays put so the user can retry
            UploadOutcome::Rejected { message } => Self {
                upload_status: format!("upload failed: {message}"),
                ..self
            },
            UploadOutcome::Unreachable => Self {
                upload_status: MSG_NETWORK_ERROR.to_string(),
                ..self
            },
        }
    }

    /// True while the status text still carries the uploading marker. The
    /// driver starts a transfer only when a click leaves this true.
    pub fn upload_in_progress(&self) -> bool {
        self.upload_status.contains(MSG_UPLOADING)
    }

    /// The progress bar renders only mid-upload; any terminal status hides
    /// it regardless of the last recorded percentage.
    pub fn progress_bar_visible(&self) -> bool {
        self.upload_progress > 0 && self.upload_in_progress()
    }

    /// Classifies the status line by substring, exactly as the display
    /// styles it. `None` while idle.
    pub fn status_tone(&self) -> Option<StatusTone> {
        if self.upload_status.is_empty() {
            return None;
        }
        if ERROR_MARKERS.iter().any(|marker| self.upload_status.contains(marker)) {
            Some(StatusTone::Error)
        } else {
            Some(StatusTone::Success)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uploader::outcome_for_response;

    fn file(name: &str) -> SelectedFile {
        SelectedFile::new(name, b"contents".to_vec())
    }

    fn state_with_file(name: &str) -> WidgetState {
        WidgetState::default().apply(WidgetEvent::Picked(vec![file(name)]))
    }

    #[test]
    fn drag_gestures_toggle_the_flag() {
        let state = WidgetState::default().apply(WidgetEvent::DragEnter);
        assert!(state.is_dragging);
        let state = state.apply(WidgetEvent::DragLeave);
        assert!(!state.is_dragging);
    }

    #[test]
    fn drop_keeps_only_the_first_file_and_resets_feedback() {
        let state = WidgetState {
            is_dragging: true,
            upload_status: "stale".to_string(),
            upload_progress: 80,
            ..WidgetState::default()
        };

        let state = state.apply(WidgetEvent::Dropped(vec![file("a.txt"), file("b.txt")]));

        assert!(!state.is_dragging);
        assert_eq!(state.selected_file.as_ref().unwrap().name, "a.txt");
        assert!(state.upload_status.is_empty());
        assert_eq!(state.upload_progress, 0);
    }

    #[test]
    fn empty_drop_keeps_the_previous_selection() {
        let state = state_with_file("keep.txt").apply(WidgetEvent::Dropped(vec![]));
        assert_eq!(state.selected_file.as_ref().unwrap().name, "keep.txt");
    }

    #[test]
    fn picking_replaces_the_selection_wholesale() {
        let state = state_with_file("old.txt").apply(WidgetEvent::Picked(vec![file("new.txt")]));
        assert_eq!(state.selected_file.as_ref().unwrap().name, "new.txt");
    }

    #[test]
    fn upload_click_without_a_file_asks_for_one_and_starts_nothing() {
        let state = WidgetState::default().apply(WidgetEvent::UploadClicked);

        assert_eq!(state.upload_status, "please select a file first.");
        // the driver gates the network call on this, so no request goes out
        assert!(!state.upload_in_progress());
    }

    #[test]
    fn upload_click_with_a_file_enters_the_uploading_state() {
        let state = state_with_file("a.txt").apply(WidgetEvent::UploadClicked);

        assert!(state.upload_in_progress());
        assert_eq!(state.upload_progress, 0);
        assert!(state.selected_file.is_some());
    }

    #[test]
    fn successful_outcome_shows_the_server_message_and_clears_the_file() {
        let outcome =
            outcome_for_response(200, r#"{"message":"ok","filename":"a.txt","path":"/u/a.txt"}"#);
        let state = state_with_file("a.txt")
            .apply(WidgetEvent::UploadClicked)
            .apply(WidgetEvent::Finished(outcome));

        assert!(state.upload_status.contains("ok"));
        assert!(state.selected_file.is_none());
        assert_eq!(state.status_tone(), Some(StatusTone::Success));
    }

    #[test]
    fn server_failure_shows_its_message_and_keeps_the_file() {
        let outcome = outcome_for_response(500, r#"{"message":"disk full"}"#);
        let state = state_with_file("a.txt")
            .apply(WidgetEvent::UploadClicked)
            .apply(WidgetEvent::Finished(outcome));

        assert!(state.upload_status.contains("disk full"));
        assert_eq!(state.selected_file.as_ref().unwrap().name, "a.txt");
        assert_eq!(state.status_tone(), Some(StatusTone::Error));
    }

    #[test]
    fn transport_failure_shows_the_fixed_network_message() {
        let state = state_with_file("a.txt")
            .apply(WidgetEvent::UploadClicked)
            .apply(WidgetEvent::Finished(UploadOutcome::Unreachable));

        assert_eq!(
            state.upload_status,
            "upload failed: network error or no response from the server."
        );
        assert_eq!(state.status_tone(), Some(StatusTone::Error));
        assert!(state.selected_file.is_some());
    }

    #[test]
    fn progress_bar_shows_mid_upload_and_hides_on_any_terminal_status() {
        let uploading = state_with_file("a.txt")
            .apply(WidgetEvent::UploadClicked)
            .apply(WidgetEvent::Progress(40));
        assert!(uploading.progress_bar_visible());

        let done = uploading.clone().apply(WidgetEvent::Finished(UploadOutcome::Completed {
            message: None,
        }));
        assert!(!done.progress_bar_visible());

        let failed = uploading.apply(WidgetEvent::Finished(UploadOutcome::Unreachable));
        assert!(!failed.progress_bar_visible());
    }

    #[test]
    fn progress_events_update_the_percentage() {
        let mut state = state_with_file("a.txt").apply(WidgetEvent::UploadClicked);
        for pct in [10, 45, 99, 100] {
            state = state.apply(WidgetEvent::Progress(pct));
            assert_eq!(state.upload_progress, pct);
        }
    }

    #[test]
    fn idle_state_has_no_tone() {
        assert_eq!(WidgetState::default().status_tone(), None);
    }
}

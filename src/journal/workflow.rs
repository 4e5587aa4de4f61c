// Entry workflow - what happens between opening today's diary and a
// saved post. The states and transitions are pure; `EntryWorkflow`
// drives them against the repository and the device store.
use chrono::NaiveDate;
use thiserror::Error;

use crate::device::{DeviceStore, DraftCache};
use crate::journal::model::{Author, ImageChange, NewImage, Post};
use crate::journal::repository::{PostRepository, RepositoryError};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{0}")]
    InvalidTransition(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// What the author has typed and picked but not yet saved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorContent {
    pub comment: String,
    pub image: ImageChange,
}

impl EditorContent {
    /// Editor preloaded from a saved entry, image untouched.
    pub fn from_post(post: &Post) -> Self {
        Self {
            comment: post.comment.clone().unwrap_or_default(),
            image: ImageChange::Keep,
        }
    }
}

/// Where one author's entry for one day currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryState {
    /// Today's entry has not been fetched yet
    Loading,

    /// Nothing saved today; the editor may hold a restored draft
    NoEntryToday { editor: EditorContent },

    /// Today's entry exists and is open for editing
    HasEntryToday { post: Post, editor: EditorContent },

    /// A create or update is in flight
    Submitting { existing: Option<Post>, editor: EditorContent },

    /// The save landed. `created` distinguishes a first save from an
    /// update of the existing entry
    Saved { post: Post, created: bool },

    /// The store already had an entry for the day; nothing was written
    /// and the editor content survives
    ConflictRejected { editor: EditorContent },

    /// The save itself failed; the editor content survives
    Failed { existing: Option<Post>, editor: EditorContent },
}

/// What the attempted save came back with.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Created(Post),
    Updated(Post),
    Conflict,
    Failed,
}

/// Pure state transitions - no side effects!
impl EntryState {
    /// Get state name for debugging/logging
    pub fn state_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading",
            Self::NoEntryToday { .. } => "NoEntryToday",
            Self::HasEntryToday { .. } => "HasEntryToday",
            Self::Submitting { .. } => "Submitting",
            Self::Saved { .. } => "Saved",
            Self::ConflictRejected { .. } => "ConflictRejected",
            Self::Failed { .. } => "Failed",
        }
    }

    /// Get editor content (if the state carries any)
    pub fn editor(&self) -> Option<&EditorContent> {
        match self {
            Self::NoEntryToday { editor } => Some(editor),
            Self::HasEntryToday { editor, .. } => Some(editor),
            Self::Submitting { editor, .. } => Some(editor),
            Self::ConflictRejected { editor } => Some(editor),
            Self::Failed { editor, .. } => Some(editor),
            Self::Loading | Self::Saved { .. } => None,
        }
    }

    /// Get the saved entry (if the state carries one)
    pub fn post(&self) -> Option<&Post> {
        match self {
            Self::HasEntryToday { post, .. } => Some(post),
            Self::Submitting { existing, .. } => existing.as_ref(),
            Self::Saved { post, .. } => Some(post),
            Self::Failed { existing, .. } => existing.as_ref(),
            _ => None,
        }
    }

    /// Transition: Loading → NoEntryToday | HasEntryToday
    /// The draft is only consulted when no entry exists yet.
    pub fn finish_loading(
        self,
        found: Option<Post>,
        draft: Option<String>,
    ) -> Result<Self, WorkflowError> {
        match self {
            Self::Loading => Ok(match found {
                Some(post) => {
                    let editor = EditorContent::from_post(&post);
                    Self::HasEntryToday { post, editor }
                }
                None => Self::NoEntryToday {
                    editor: EditorContent {
                        comment: draft.unwrap_or_default(),
                        image: ImageChange::Keep,
                    },
                },
            }),
            other => Err(WorkflowError::InvalidTransition(format!(
                "Cannot finish loading from {} state",
                other.state_name()
            ))),
        }
    }

    /// Replace the editor's comment text
    pub fn edit_comment(self, comment: impl Into<String>) -> Result<Self, WorkflowError> {
        let comment = comment.into();
        match self {
            Self::NoEntryToday { mut editor } => {
                editor.comment = comment;
                Ok(Self::NoEntryToday { editor })
            }
            Self::HasEntryToday { post, mut editor } => {
                editor.comment = comment;
                Ok(Self::HasEntryToday { post, editor })
            }
            other => Err(WorkflowError::InvalidTransition(format!(
                "Cannot edit comment from {} state",
                other.state_name()
            ))),
        }
    }

    /// Pick a new image for the entry
    pub fn attach_image(self, image: NewImage) -> Result<Self, WorkflowError> {
        self.set_image(ImageChange::Replace(image), "attach an image")
    }

    /// Drop the current image, both a picked one and a saved one
    pub fn remove_image(self) -> Result<Self, WorkflowError> {
        self.set_image(ImageChange::Remove, "remove the image")
    }

    fn set_image(self, image: ImageChange, action: &str) -> Result<Self, WorkflowError> {
        match self {
            Self::NoEntryToday { mut editor } => {
                editor.image = image;
                Ok(Self::NoEntryToday { editor })
            }
            Self::HasEntryToday { post, mut editor } => {
                editor.image = image;
                Ok(Self::HasEntryToday { post, editor })
            }
            other => Err(WorkflowError::InvalidTransition(format!(
                "Cannot {} from {} state",
                action,
                other.state_name()
            ))),
        }
    }

    /// Transition: NoEntryToday | HasEntryToday → Submitting
    pub fn begin_submit(self) -> Result<Self, WorkflowError> {
        match self {
            Self::NoEntryToday { editor } => Ok(Self::Submitting { existing: None, editor }),
            Self::HasEntryToday { post, editor } => {
                Ok(Self::Submitting { existing: Some(post), editor })
            }
            other => Err(WorkflowError::InvalidTransition(format!(
                "Cannot submit from {} state",
                other.state_name()
            ))),
        }
    }

    /// Transition: Submitting → Saved | ConflictRejected | Failed
    pub fn complete(self, outcome: SubmitOutcome) -> Result<Self, WorkflowError> {
        match self {
            Self::Submitting { existing, editor } => Ok(match outcome {
                SubmitOutcome::Created(post) => Self::Saved { post, created: true },
                SubmitOutcome::Updated(post) => Self::Saved { post, created: false },
                SubmitOutcome::Conflict => Self::ConflictRejected { editor },
                SubmitOutcome::Failed => Self::Failed { existing, editor },
            }),
            other => Err(WorkflowError::InvalidTransition(format!(
                "Cannot complete a submit from {} state",
                other.state_name()
            ))),
        }
    }

    /// Leave a resolution state and go back to editing. After a save
    /// the editor reflects the saved entry; after a conflict or a
    /// failure the typed content is carried along unchanged.
    pub fn acknowledge(self) -> Result<Self, WorkflowError> {
        match self {
            Self::Saved { post, .. } => {
                let editor = EditorContent::from_post(&post);
                Ok(Self::HasEntryToday { post, editor })
            }
            Self::ConflictRejected { editor } => Ok(Self::NoEntryToday { editor }),
            Self::Failed { existing, editor } => Ok(match existing {
                Some(post) => Self::HasEntryToday { post, editor },
                None => Self::NoEntryToday { editor },
            }),
            other => Err(WorkflowError::InvalidTransition(format!(
                "Nothing to acknowledge in {} state",
                other.state_name()
            ))),
        }
    }
}

/// Drives the entry states for one author and one day. Repository
/// failures never escape a submit; they resolve into the
/// `ConflictRejected` and `Failed` states instead.
pub struct EntryWorkflow<'a> {
    repo: &'a dyn PostRepository,
    drafts: DraftCache<'a>,
    author: Author,
    today: NaiveDate,
}

impl<'a> EntryWorkflow<'a> {
    pub fn new(
        repo: &'a dyn PostRepository,
        device: &'a dyn DeviceStore,
        author: Author,
        today: NaiveDate,
    ) -> Self {
        Self { repo, drafts: DraftCache::new(device), author, today }
    }

    /// Fetch today's entry and resolve the Loading state. The saved
    /// draft fills the editor only when nothing was posted yet.
    pub async fn open(&self) -> Result<EntryState, WorkflowError> {
        let posts = self.repo.posts_for_date(self.today).await?;
        let found = posts.into_iter().find(|p| p.author == self.author);
        let draft = match found {
            Some(_) => None,
            None => self.drafts.get(self.author),
        };
        EntryState::Loading.finish_loading(found, draft)
    }

    /// Edit the comment, mirroring it into the draft cache while no
    /// entry is saved so an interrupted session can pick it back up.
    pub fn edit_comment(
        &self,
        state: EntryState,
        comment: impl Into<String>,
    ) -> Result<EntryState, WorkflowError> {
        let next = state.edit_comment(comment)?;
        if let EntryState::NoEntryToday { editor } = &next {
            self.drafts.set(self.author, &editor.comment);
        }
        Ok(next)
    }

    /// Run the whole submit: Submitting, then the repository call, then
    /// the resolution state. A first successful save clears the draft.
    pub async fn submit(&self, state: EntryState) -> Result<EntryState, WorkflowError> {
        let submitting = state.begin_submit()?;
        let outcome = self.perform(&submitting).await?;
        let next = submitting.complete(outcome)?;

        if matches!(next, EntryState::Saved { created: true, .. }) {
            self.drafts.clear(self.author);
        }
        Ok(next)
    }

    /// Resolve an acknowledged state. A conflict means someone else's
    /// save won the day, so the entry is refetched to show it.
    pub async fn acknowledge(&self, state: EntryState) -> Result<EntryState, WorkflowError> {
        match state {
            EntryState::ConflictRejected { .. } => self.open().await,
            other => other.acknowledge(),
        }
    }

    async fn perform(&self, state: &EntryState) -> Result<SubmitOutcome, WorkflowError> {
        let EntryState::Submitting { existing, editor } = state else {
            return Err(WorkflowError::InvalidTransition(format!(
                "Cannot perform a save from {} state",
                state.state_name()
            )));
        };

        let comment = normalize_comment(&editor.comment);
        let result = match existing {
            None => {
                let image = match editor.image.clone() {
                    ImageChange::Replace(img) => Some(img),
                    ImageChange::Keep | ImageChange::Remove => None,
                };
                self.repo
                    .create_post(self.today, self.author, comment, image)
                    .await
                    .map(SubmitOutcome::Created)
            }
            Some(post) => self
                .repo
                .update_post(post.id, comment, editor.image.clone())
                .await
                .map(SubmitOutcome::Updated),
        };

        Ok(match result {
            Ok(outcome) => outcome,
            Err(RepositoryError::Conflict { date, author }) => {
                tracing::info!("Entry for {} on {} already exists, rejecting save", author, date);
                SubmitOutcome::Conflict
            }
            Err(e) => {
                tracing::error!("Saving the entry for {} failed: {}", self.author, e);
                SubmitOutcome::Failed
            }
        })
    }
}

/// Empty comments are stored as missing, not as empty strings.
fn normalize_comment(comment: &str) -> Option<String> {
    if comment.is_empty() {
        None
    } else {
        Some(comment.to_string())
    }
}

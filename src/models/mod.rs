use serde::Deserialize;

/// One page of the `/{object_id}/comments` edge.
#[derive(Debug, Deserialize)]
pub struct CommentsPage {
    #[serde(default)]
    pub data: Vec<Comment>,
    pub paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
pub struct Comment {
    pub created_time: String,
}

#[derive(Debug, Deserialize)]
pub struct Paging {
    pub cursors: Option<PagingCursors>,
    #[allow(dead_code)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PagingCursors {
    #[allow(dead_code)]
    pub before: Option<String>,
    pub after: Option<String>,
}

impl CommentsPage {
    /// Cursor to request the next page with, if the API announced one.
    pub fn after_cursor(&self) -> Option<&str> {
        self.paging
            .as_ref()
            .and_then(|p| p.cursors.as_ref())
            .and_then(|c| c.after.as_deref())
    }
}

/// Error envelope the Graph API wraps failures in.
#[derive(Debug, Deserialize)]
pub struct GraphErrorResponse {
    pub error: GraphError,
}

#[derive(Debug, Deserialize)]
pub struct GraphError {
    pub message: String,
    #[serde(rename = "type")]
    #[allow(dead_code)]
    pub kind: Option<String>,
    pub code: Option<i64>,
}

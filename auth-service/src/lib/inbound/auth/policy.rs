/// Decides which request paths need authentication.
///
/// Paths are compared slash-tolerant: `/api/v1/status` and `/api/v1/status/`
/// are the same path.
#[derive(Debug, Clone, Default)]
pub struct AuthPolicy {
    excluded_paths: Vec<String>,
}

impl AuthPolicy {
    pub fn new<I, S>(excluded_paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded_paths: excluded_paths
                .into_iter()
                .map(|path| with_trailing_slash(path.into()))
                .collect(),
        }
    }

    /// Whether a request to `path` must be authenticated.
    ///
    /// Absent paths and policies without exclusions always require it.
    pub fn requires_auth(&self, path: Option<&str>) -> bool {
        let Some(path) = path else {
            return true;
        };
        if self.excluded_paths.is_empty() {
            return true;
        }

        let path = with_trailing_slash(path.to_string());
        !self.excluded_paths.iter().any(|excluded| *excluded == path)
    }
}

fn with_trailing_slash(mut path: String) -> String {
    if !path.ends_with('/') {
        path.push('/');
    }
    path
}

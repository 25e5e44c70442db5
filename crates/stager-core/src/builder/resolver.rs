use thiserror::Error;
use url::Url;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ResolveError(String);

impl ResolveError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Produces artifact URLs for a staging task.
///
/// Path templates belong to the artifact service; the builder only asks for the URLs.
pub trait ArtifactResolver: Send + Sync {
    /// Download URL for a compiler archive stored under `compiler_path`.
    fn compiler_download_url(&self, compiler_path: &str) -> Result<String, ResolveError>;

    /// URL the worker uploads the droplet of `app_id` to.
    fn droplet_upload_url(&self, app_id: &str) -> Result<String, ResolveError>;
}

/// Resolver for the fleet file server.
///
/// Static assets live under `/v1/static/<path>`, droplets are uploaded to `/v1/droplet/<app_id>`.
#[derive(Debug, Clone)]
pub struct FileServerResolver {
    base: Url,
}

impl FileServerResolver {
    pub fn new(base: &str) -> Result<Self, ResolveError> {
        let base =
            Url::parse(base).map_err(|e| ResolveError::new(format!("invalid file server url {base:?}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ResolveError::new(format!("file server url {base} cannot be a base")));
        }
        Ok(Self { base })
    }

    fn join<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<String, ResolveError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ResolveError::new("file server url cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }
}

impl ArtifactResolver for FileServerResolver {
    fn compiler_download_url(&self, compiler_path: &str) -> Result<String, ResolveError> {
        let path = compiler_path.split('/').filter(|s| !s.is_empty());
        self.join(["v1", "static"].into_iter().chain(path))
    }

    fn droplet_upload_url(&self, app_id: &str) -> Result<String, ResolveError> {
        self.join(["v1", "droplet", app_id])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_static_and_droplet_routes() {
        let r = FileServerResolver::new("http://file-server.service:8080/").unwrap();

        assert_eq!(
            r.compiler_download_url("compilers/cflinuxfs4.tgz").unwrap(),
            "http://file-server.service:8080/v1/static/compilers/cflinuxfs4.tgz"
        );
        assert_eq!(
            r.droplet_upload_url("my-app").unwrap(),
            "http://file-server.service:8080/v1/droplet/my-app"
        );
    }

    #[test]
    fn keeps_base_path_prefix() {
        let r = FileServerResolver::new("http://fs/prefix").unwrap();
        assert_eq!(
            r.droplet_upload_url("app").unwrap(),
            "http://fs/prefix/v1/droplet/app"
        );
    }

    #[test]
    fn escapes_app_ids() {
        let r = FileServerResolver::new("http://fs").unwrap();
        assert_eq!(
            r.droplet_upload_url("a/b").unwrap(),
            "http://fs/v1/droplet/a%2Fb"
        );
    }

    #[test]
    fn rejects_invalid_base() {
        assert!(FileServerResolver::new("not a url").is_err());
        assert!(FileServerResolver::new("mailto:ops@example.com").is_err());
    }
}

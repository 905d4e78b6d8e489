use crate::error::{ExportError, Result};
use git2::{Oid, Repository, Signature, Time};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_AUTHOR_NAME: &str = "Simplenote Export";
const DEFAULT_AUTHOR_EMAIL: &str = "simplenote-export@localhost";

/// Name and email recorded on every generated commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitAuthor {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Git history writer for the export directory
///
/// Each note becomes one commit whose author and committer time is the
/// note's modification time at UTC+0.
pub struct GitOps {
    repo: Repository,
    name: String,
    email: String,
}

impl GitOps {
    /// Initialize (or reopen) a repository at `dir`
    ///
    /// Unset author fields fall back to the repository's `user.name` and
    /// `user.email` config, then to a fixed default identity.
    pub fn init(dir: &Path, author: &GitAuthor) -> Result<Self> {
        let repo = Repository::init(dir)?;
        let (name, email) = Self::resolve_author(&repo, author);
        Ok(Self { repo, name, email })
    }

    fn resolve_author(repo: &Repository, author: &GitAuthor) -> (String, String) {
        let config = repo.config().ok();
        let from_config = |key: &str| config.as_ref().and_then(|c| c.get_string(key).ok());

        let name = author
            .name
            .clone()
            .or_else(|| from_config("user.name"))
            .unwrap_or_else(|| DEFAULT_AUTHOR_NAME.to_string());
        let email = author
            .email
            .clone()
            .or_else(|| from_config("user.email"))
            .unwrap_or_else(|| DEFAULT_AUTHOR_EMAIL.to_string());
        (name, email)
    }

    /// Working directory of the repository
    pub fn workdir(&self) -> Result<&Path> {
        self.repo
            .workdir()
            .ok_or_else(|| ExportError::VersionControl(git2::Error::from_str("bare repository")))
    }

    /// Add a file, given relative to the working directory, to the index
    pub fn stage(&self, relative_path: &Path) -> Result<()> {
        let mut index = self.repo.index()?;
        index.add_path(relative_path)?;
        index.write()?;
        Ok(())
    }

    /// Commit the current index on top of HEAD
    ///
    /// # Arguments
    /// * `message` - Full commit message
    /// * `epoch_seconds` - Author and committer time, recorded at offset 0
    pub fn commit(&self, message: &str, epoch_seconds: i64) -> Result<Oid> {
        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;

        // An unborn HEAD means this is the first commit
        let parent_commit = match self.repo.head() {
            Ok(head) => {
                let oid = head
                    .target()
                    .ok_or_else(|| git2::Error::from_str("HEAD has no target"))?;
                Some(self.repo.find_commit(oid)?)
            }
            Err(_) => None,
        };
        let parents: Vec<_> = parent_commit.iter().collect();

        let time = Time::new(epoch_seconds, 0);
        let signature = Signature::new(&self.name, &self.email, &time)?;

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;
        Ok(oid)
    }

    pub fn author_name(&self) -> &str {
        &self.name
    }

    pub fn author_email(&self) -> &str {
        &self.email
    }
}

// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Remote transfer.
//!
//! Pulling and pushing are the only operations that cross a process
//! boundary. Both block the calling thread, and both report whatever the
//! remote sends back through a progress callback in the order it arrives.
//! Credentials are resolved through [`auth_git2`], which may prompt the user.

use crate::repo::{Git2Repository, RepoError, Result, ORIGIN};

use auth_git2::{GitAuthenticator, Prompter};
use git2::{build::CheckoutBuilder, FetchOptions, PushOptions, RemoteCallbacks};
use indicatif::ProgressBar;
use inquire::{Password, Text};
use std::path::Path;
use tracing::{debug, info, instrument};

impl Git2Repository {
    /// Fetch current branch from origin and fast-forward onto it.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::Transport`] if the remote cannot be reached.
    /// - Return [`RepoError::RefUpdate`] if local history has diverged.
    /// - Return [`RepoError::Git2`] if libgit2 operations fail.
    #[instrument(skip(self, authenticator, progress), level = "debug")]
    pub fn fetch(&self, authenticator: &GitAuthenticator, progress: &mut dyn FnMut(&str)) -> Result<()> {
        let branch = self.current_branch()?;
        let refspec = format!("+refs/heads/{branch}:refs/remotes/{ORIGIN}/{branch}");
        let config = self.repository.config()?;
        let mut remote = self.repository.find_remote(ORIGIN)?;
        info!("fetch {refspec} from {:?}", remote.url().unwrap_or_default());

        {
            let mut callbacks = RemoteCallbacks::new();
            callbacks.credentials(authenticator.credentials(&config));
            callbacks.sideband_progress(|data| {
                progress(&String::from_utf8_lossy(data));
                true
            });

            let mut opts = FetchOptions::new();
            opts.remote_callbacks(callbacks);
            remote
                .fetch(&[refspec.as_str()], Some(&mut opts), None)
                .map_err(|source| RepoError::Transport { source })?;
        }

        self.fast_forward(&branch)
    }

    /// Push current branch to origin.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::Transport`] if the remote cannot be reached.
    /// - Return [`RepoError::RefUpdate`] if the remote rejects the update.
    /// - Return [`RepoError::Git2`] if libgit2 operations fail.
    #[instrument(skip(self, authenticator, progress), level = "debug")]
    pub fn push(&self, authenticator: &GitAuthenticator, progress: &mut dyn FnMut(&str)) -> Result<()> {
        let branch = self.current_branch()?;
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        let config = self.repository.config()?;
        let mut remote = self.repository.find_remote(ORIGIN)?;
        info!("push {refspec} to {:?}", remote.url().unwrap_or_default());

        let mut rejected = None;
        {
            let mut callbacks = RemoteCallbacks::new();
            callbacks.credentials(authenticator.credentials(&config));
            callbacks.sideband_progress(|data| {
                progress(&String::from_utf8_lossy(data));
                true
            });
            callbacks.push_update_reference(|refname, status| {
                if let Some(message) = status {
                    rejected = Some((refname.to_string(), message.to_string()));
                }
                Ok(())
            });

            let mut opts = PushOptions::new();
            opts.remote_callbacks(callbacks);
            remote
                .push(&[refspec.as_str()], Some(&mut opts))
                .map_err(|source| RepoError::Transport { source })?;
        }

        match rejected {
            Some((refname, message)) => Err(RepoError::RefUpdate { refname, message }),
            None => Ok(()),
        }
    }

    fn fast_forward(&self, branch: &str) -> Result<()> {
        let remote_ref = format!("refs/remotes/{ORIGIN}/{branch}");
        let local_ref = format!("refs/heads/{branch}");
        let Ok(fetched) = self.repository.find_reference(&remote_ref) else {
            debug!("remote has no {branch} branch yet");
            return Ok(());
        };
        let fetched = self.repository.reference_to_annotated_commit(&fetched)?;
        let (analysis, _) = self.repository.merge_analysis(&[&fetched])?;

        if analysis.is_up_to_date() {
            debug!("{local_ref} already up to date");
            return Ok(());
        }

        if !(analysis.is_fast_forward() || analysis.is_unborn()) {
            return Err(RepoError::RefUpdate {
                refname: local_ref,
                message: "local history diverged from remote".into(),
            });
        }

        info!("fast-forward {local_ref} to {}", fetched.id());

        // INVARIANT: Check out against the old HEAD, never over uncommitted work.
        let target = self.repository.find_object(fetched.id(), None)?;
        let mut checkout = CheckoutBuilder::new();
        checkout.safe();
        self.repository.checkout_tree(&target, Some(&mut checkout))?;

        self.repository
            .reference(&local_ref, fetched.id(), true, "pull: fast-forward")?;
        self.repository.set_head(&local_ref)?;

        Ok(())
    }
}

/// Git2 authentication prompter for progress bar.
#[derive(Debug, Clone)]
pub struct IndicatifPrompter {
    pub(crate) bar: ProgressBar,
}

impl IndicatifPrompter {
    /// Construct new progress bar authenticator.
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl Prompter for IndicatifPrompter {
    #[instrument(skip(self, url, _config), level = "debug")]
    fn prompt_username_password(
        &mut self,
        url: &str,
        _config: &git2::Config,
    ) -> Option<(String, String)> {
        info!("authentication required at {url}");
        self.bar.suspend(|| -> Option<(String, String)> {
            let username = Text::new("username").prompt().ok()?;
            let password = Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()?;
            Some((username, password))
        })
    }

    #[instrument(skip(self, username, url, _config), level = "debug")]
    fn prompt_password(
        &mut self,
        username: &str,
        url: &str,
        _config: &git2::Config,
    ) -> Option<String> {
        info!("authentication required at {url} for user {username}");
        self.bar.suspend(|| -> Option<String> {
            Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()
        })
    }

    #[instrument(skip(self, ssh_key_path, _config), level = "debug")]
    fn prompt_ssh_key_passphrase(
        &mut self,
        ssh_key_path: &Path,
        _config: &git2::Config,
    ) -> Option<String> {
        info!(
            "authentication required with ssh key at {}",
            ssh_key_path.display()
        );
        self.bar.suspend(|| -> Option<String> {
            Password::new("passphrase")
                .without_confirmation()
                .prompt()
                .ok()
        })
    }
}

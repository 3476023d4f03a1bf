use std::io::{self, Write};

use pawmatch_core::{SessionService, SessionStatus, check_session};
use serde_json::json;
use tracing::{info, warn};

use crate::cli::{LoginArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult, timestamp_now_ms};
use crate::state::StoredSession;

pub(crate) async fn handle_login(ctx: &AppContext, args: LoginArgs) -> CliResult<()> {
    let name = args.name.trim();
    let email = args.email.trim();
    validate_login(name, email)?;

    ctx.catalog.login(name, email).await?;
    ctx.paths.save_session(&StoredSession {
        name: name.to_string(),
        email: email.to_string(),
        cookie: ctx.catalog.cookie(),
        created_at_ms: timestamp_now_ms(),
    })?;
    info!(name, "logged in");
    println!("Logged in as {name}");
    Ok(())
}

pub(crate) async fn handle_logout(ctx: &AppContext) -> CliResult<()> {
    if let Err(err) = ctx.catalog.logout().await {
        warn!(error = %err, "remote logout failed; clearing local session anyway");
    }
    ctx.paths.clear_session()?;
    println!("Logged out");
    Ok(())
}

pub(crate) async fn handle_status(ctx: &AppContext) -> CliResult<()> {
    let saved = ctx.paths.load_session();
    let status = if saved.as_ref().and_then(|s| s.cookie.as_ref()).is_some() {
        check_session(&ctx.catalog).await?
    } else {
        SessionStatus::Anonymous
    };
    let authenticated = status == SessionStatus::Authenticated;
    let name = saved.as_ref().map(|session| session.name.as_str());

    let mut out = io::stdout().lock();
    match ctx.output {
        OutputFormat::Json => {
            let value = json!({
                "authenticated": authenticated,
                "name": name,
                "state_dir": ctx.paths.root().display().to_string(),
            });
            writeln!(out, "{value}")?;
        }
        OutputFormat::Table => {
            match (authenticated, name) {
                (true, Some(name)) => writeln!(out, "Logged in as {name}")?,
                (true, None) => writeln!(out, "Logged in")?,
                (false, _) => writeln!(out, "Not logged in; run `pawmatch login`")?,
            }
            writeln!(out, "state: {}", ctx.paths.root().display())?;
        }
    }
    Ok(())
}

fn validate_login(name: &str, email: &str) -> CliResult<()> {
    if name.is_empty() {
        return Err(CliError::validation("name must not be empty"));
    }
    let valid_email = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && domain
                .split_once('.')
                .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
    });
    if !valid_email {
        return Err(CliError::validation(format!(
            "'{email}' is not a valid email address"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_context;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn login_input_is_validated() {
        assert!(validate_login("Ada", "ada@example.com").is_ok());
        assert!(validate_login("", "ada@example.com").is_err());
        assert!(validate_login("Ada", "ada.example.com").is_err());
        assert!(validate_login("Ada", "@example.com").is_err());
        assert!(validate_login("Ada", "ada@localhost").is_err());
        assert!(validate_login("Ada", "a@b@c.com").is_err());
    }

    #[tokio::test]
    async fn login_persists_session_cookie() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/auth/login")
                .json_body(json!({"name": "Ada", "email": "ada@example.com"}));
            then.status(200)
                .header("set-cookie", "fetch-access-token=tok; HttpOnly")
                .body("OK");
        });
        let dir = TempDir::new()?;
        let ctx = test_context(&server, dir.path());

        handle_login(
            &ctx,
            LoginArgs {
                name: " Ada ".into(),
                email: "ada@example.com".into(),
            },
        )
        .await
        .map_err(|err| anyhow::anyhow!(err.display_message()))?;

        mock.assert();
        let saved = ctx.paths.load_session().expect("session saved");
        assert_eq!(saved.name, "Ada");
        assert_eq!(saved.cookie.as_deref(), Some("fetch-access-token=tok"));
        Ok(())
    }

    #[tokio::test]
    async fn rejected_login_is_not_saved() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(500);
        });
        let dir = TempDir::new()?;
        let ctx = test_context(&server, dir.path());
        let result = handle_login(
            &ctx,
            LoginArgs {
                name: "Ada".into(),
                email: "ada@example.com".into(),
            },
        )
        .await;
        assert!(matches!(result, Err(CliError::Failure(_))));
        assert!(ctx.paths.load_session().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn logout_clears_local_session_when_remote_fails() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/auth/logout");
            then.status(502);
        });
        let dir = TempDir::new()?;
        let ctx = test_context(&server, dir.path());
        ctx.paths
            .save_session(&StoredSession {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                cookie: Some("fetch-access-token=tok".into()),
                created_at_ms: 0,
            })
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;

        handle_logout(&ctx)
            .await
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;
        assert!(ctx.paths.load_session().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn status_without_cookie_skips_probe() -> anyhow::Result<()> {
        // No mocks: any probe would get a 404 and fail the command.
        let server = MockServer::start_async().await;
        let dir = TempDir::new()?;
        let ctx = test_context(&server, dir.path());
        handle_status(&ctx)
            .await
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;
        Ok(())
    }

    #[tokio::test]
    async fn status_treats_rejected_cookie_as_anonymous() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let probe = server.mock(|when, then| {
            when.method(GET)
                .path("/dogs/breeds")
                .header("cookie", "fetch-access-token=stale");
            then.status(401);
        });
        let dir = TempDir::new()?;
        let paths = crate::state::StatePaths::new(dir.path());
        paths
            .save_session(&StoredSession {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                cookie: Some("fetch-access-token=stale".into()),
                created_at_ms: 0,
            })
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;
        let ctx = test_context(&server, dir.path());

        handle_status(&ctx)
            .await
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;
        probe.assert();
        Ok(())
    }
}

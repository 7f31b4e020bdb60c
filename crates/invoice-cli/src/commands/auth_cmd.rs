use invoice_core::session::AuthStatus;
use invoice_core::state::{Redirect, StatusMessage, View};

use crate::cli::AuthCommands;
use crate::commands::common::{format_nav_line, format_status_line, ClientContext};
use crate::commands::history::run_history;
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, context: &ClientContext) -> Result<(), CliError> {
    match command {
        AuthCommands::Login {
            identifier,
            password,
        } => {
            let success = context
                .auth_flow()
                .sign_in(&identifier, &password)
                .await?;
            println!(
                "{}",
                format_status_line(&StatusMessage::success(success.message))
            );
            follow_redirect(success.redirect, context).await
        }
        AuthCommands::Signup {
            username,
            email,
            password,
        } => {
            let success = context
                .auth_flow()
                .sign_up(&username, &email, &password)
                .await?;
            println!(
                "{}",
                format_status_line(&StatusMessage::success(success.message))
            );
            if success.authenticated {
                follow_redirect(success.redirect, context).await
            } else {
                println!("Sign in with `invoice auth login` to open your dashboard.");
                Ok(())
            }
        }
        AuthCommands::Status => {
            let status = context.session.status();
            match status {
                AuthStatus::SignedIn => {
                    println!("Profile '{}' is signed in.", context.profile_name);
                }
                AuthStatus::SignedOut => {
                    println!("Profile '{}' is not signed in.", context.profile_name);
                }
            }
            println!("{}", format_nav_line(status));
            Ok(())
        }
        AuthCommands::Logout => {
            context.auth_flow().sign_out();
            println!("Signed out profile '{}'", context.profile_name);
            Ok(())
        }
    }
}

/// Wait out the redirect delay, then render the target view.
async fn follow_redirect(redirect: Redirect, context: &ClientContext) -> Result<(), CliError> {
    tokio::time::sleep(redirect.after).await;
    match redirect.view {
        View::Dashboard => run_history(context, false).await,
        View::SignIn | View::SignUp => Ok(()),
    }
}

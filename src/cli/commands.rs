//! Command dispatch: one handler per subcommand.

use std::io;
use std::path::PathBuf;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::{
    IncomeSummary, MemberProfile, ReferralSummary, TeamSummary,
};
use crate::cli::args::{Cli, Commands, ConfigCommands, MemberState, OutputArgs, SponsorCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{expand_env_vars, DomainError, Registration};
use crate::infrastructure::{InfraError, ServiceContainer};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `refnet --help`".to_string(),
        ));
    };

    match command {
        Commands::Completion { shell } => {
            cmd_completion(*shell);
            Ok(())
        }
        Commands::Config { command } => cmd_config(cli, command),
        _ => {
            let container = create_container(cli)?;
            dispatch(&container, command)
        }
    }
}

fn dispatch(container: &ServiceContainer, command: &Commands) -> CliResult<()> {
    let max_levels = |levels: &Option<usize>| levels.unwrap_or(container.settings.max_levels);

    match command {
        Commands::Register {
            name,
            email,
            mobile,
            password,
            sponsor,
        } => cmd_register(
            container,
            Registration {
                full_name: name.clone(),
                email: email.clone(),
                mobile_number: mobile.clone(),
                password: password.clone(),
                sponsor_public_id: sponsor.clone(),
            },
        ),
        Commands::NextId => {
            output::info(&container.registration.allocate_next_public_id()?);
            Ok(())
        }
        Commands::Sponsor { command } => match command {
            SponsorCommands::Check { sponsor } => cmd_sponsor_check(container, sponsor.as_deref()),
        },
        Commands::Member {
            user_id,
            internal_id,
            output,
        } => cmd_member(container, user_id.as_deref(), *internal_id, *output),
        Commands::Members { output } => cmd_members(container, *output),
        Commands::Referrals { user_id, output } => cmd_referrals(container, user_id, *output),
        Commands::Team {
            user_id,
            levels,
            output,
        } => cmd_team(container, user_id, max_levels(levels), *output),
        Commands::Income { user_id, output } => cmd_income(container, user_id, *output),
        Commands::Levels {
            user_id,
            levels,
            output,
        } => cmd_levels(container, user_id, max_levels(levels), *output),
        Commands::Tree {
            user_id,
            levels,
            output,
        } => cmd_tree(container, user_id, max_levels(levels), *output),
        Commands::Stats {
            user_id,
            levels,
            output,
        } => cmd_stats(container, user_id, max_levels(levels), *output),
        Commands::Status { internal_id, state } => cmd_status(container, *internal_id, *state),
        Commands::Backfill { user_id, sponsor } => {
            cmd_backfill(container, user_id, sponsor.as_deref())
        }
        Commands::Config { .. } | Commands::Completion { .. } => Err(CliError::Usage(
            "command does not use the member store".to_string(),
        )),
    }
}

// ============================================================
// Setup
// ============================================================

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let local_dir = match &cli.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(|e| InfraError::io("get current directory", e))?,
    };
    if !local_dir.is_dir() {
        return Err(CliError::InvalidArgs(format!(
            "not a directory: {}",
            local_dir.display()
        )));
    }

    let mut settings = Settings::load(Some(&local_dir))?;
    if let Some(store) = &cli.store {
        settings.store_path = PathBuf::from(expand_env_vars(&store.to_string_lossy()));
    }
    debug!("settings: {:?}", settings);
    Ok(settings)
}

fn create_container(cli: &Cli) -> CliResult<ServiceContainer> {
    let settings = load_settings(cli)?;
    Ok(ServiceContainer::new(settings)?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    output::info(&serde_json::to_string_pretty(value)?);
    Ok(())
}

fn status_label(is_active: bool) -> &'static str {
    if is_active {
        "active"
    } else {
        "inactive"
    }
}

// ============================================================
// Member commands
// ============================================================

#[instrument(level = "debug", skip(container, registration), fields(email = %registration.email))]
fn cmd_register(container: &ServiceContainer, registration: Registration) -> CliResult<()> {
    let member = container.registration.register(registration)?;
    output::success(&format!(
        "Registered {} ({})",
        member.public_id, member.full_name
    ));
    if let Some(sponsor) = &member.sponsor_public_id {
        output::detail(&format!("sponsor: {}", sponsor));
    }
    Ok(())
}

fn cmd_sponsor_check(container: &ServiceContainer, sponsor: Option<&str>) -> CliResult<()> {
    let label = sponsor.map(str::trim).filter(|s| !s.is_empty());
    if container.registration.is_valid_sponsor(sponsor)? {
        match label {
            Some(id) => output::success(&format!("{} can sponsor new members", id)),
            None => output::success("no sponsor given; registration without sponsor"),
        }
        Ok(())
    } else {
        let id = label.unwrap_or_default().to_string();
        output::failure(&format!("{} is unknown or inactive", id));
        Err(DomainError::InvalidSponsor(id).into())
    }
}

fn cmd_member(
    container: &ServiceContainer,
    user_id: Option<&str>,
    internal_id: Option<u64>,
    out: OutputArgs,
) -> CliResult<()> {
    let (member, key) = match (user_id, internal_id) {
        (_, Some(id)) => (container.network.member_by_internal_id(id)?, id.to_string()),
        (Some(id), None) => (container.network.member(id)?, id.to_string()),
        (None, None) => {
            return Err(CliError::InvalidArgs(
                "either a user id or --internal-id is required".to_string(),
            ))
        }
    };
    let member = member.ok_or(DomainError::MemberNotFound(key))?;
    let profile = MemberProfile::from(&member);

    if out.json {
        return print_json(&profile);
    }
    output::header(&format!("{} ({})", profile.user_id, profile.full_name));
    output::action("id", &profile.id);
    output::action("email", &profile.email);
    output::action("mobile", &profile.mobile_number);
    output::action("sponsor", profile.sponsor_id.as_deref().unwrap_or("-"));
    output::action("registered", &profile.registration_date);
    output::action("status", status_label(profile.is_active));
    if profile.is_admin {
        output::action("role", "admin");
    }
    Ok(())
}

fn cmd_members(container: &ServiceContainer, out: OutputArgs) -> CliResult<()> {
    let members = container.network.all_members()?;
    if out.json {
        let profiles: Vec<MemberProfile> = members.iter().map(MemberProfile::from).collect();
        return print_json(&profiles);
    }
    output::header(&format!("{} members", members.len()));
    for m in &members {
        output::member_row(
            &format!(
                "{:<10} {:<24} sponsor {:<10} {}",
                m.public_id,
                m.full_name,
                m.sponsor_public_id.as_deref().unwrap_or("-"),
                status_label(m.is_active)
            ),
            m.is_active,
        );
    }
    Ok(())
}

fn cmd_status(container: &ServiceContainer, internal_id: u64, state: MemberState) -> CliResult<()> {
    if !container
        .registration
        .update_status(internal_id, state.is_active())?
    {
        return Err(DomainError::MemberNotFound(internal_id.to_string()).into());
    }
    output::success(&format!(
        "member {} is now {}",
        internal_id,
        status_label(state.is_active())
    ));
    Ok(())
}

fn cmd_backfill(container: &ServiceContainer, user_id: &str, sponsor: Option<&str>) -> CliResult<()> {
    let member = container.registration.assign_sponsor(user_id, sponsor)?;
    match &member.sponsor_public_id {
        Some(s) => output::success(&format!("{} is now sponsored by {}", member.public_id, s)),
        None => output::success(&format!("{} has no sponsor", member.public_id)),
    }
    Ok(())
}

// ============================================================
// Network queries
// ============================================================

fn cmd_referrals(container: &ServiceContainer, user_id: &str, out: OutputArgs) -> CliResult<()> {
    let referrals: Vec<ReferralSummary> = container.network.direct_referral_summaries(user_id)?;
    if out.json {
        return print_json(&referrals);
    }
    output::header(&format!(
        "Direct referrals of {} ({})",
        user_id,
        referrals.len()
    ));
    for r in &referrals {
        output::detail(&format!(
            "{:<10} {:<24} {:<28} {:<14} {}",
            r.user_id, r.full_name, r.email, r.mobile_number, r.registration_date
        ));
    }
    Ok(())
}

fn cmd_team(
    container: &ServiceContainer,
    user_id: &str,
    max_levels: usize,
    out: OutputArgs,
) -> CliResult<()> {
    let summary = TeamSummary {
        user_id: user_id.to_string(),
        max_levels,
        total_team_members: container.network.count_team(user_id, max_levels)?,
    };
    if out.json {
        return print_json(&summary);
    }
    output::action(
        &format!("Team of {} ({} levels)", user_id, max_levels),
        &summary.total_team_members,
    );
    Ok(())
}

fn cmd_income(container: &ServiceContainer, user_id: &str, out: OutputArgs) -> CliResult<()> {
    let summary = IncomeSummary {
        user_id: user_id.to_string(),
        total_income: container.network.calculate_income(user_id)?,
    };
    if out.json {
        return print_json(&summary);
    }
    output::action(&format!("Income of {}", user_id), &summary.total_income);
    Ok(())
}

fn cmd_levels(
    container: &ServiceContainer,
    user_id: &str,
    max_levels: usize,
    out: OutputArgs,
) -> CliResult<()> {
    let levels = container.network.generation_levels(user_id, max_levels)?;
    if out.json {
        return print_json(&levels);
    }
    output::header(&format!("Generation levels of {}", user_id));
    if levels.is_empty() {
        output::detail("no active referrals");
    }
    for level in &levels {
        output::detail(&format!(
            "Level {}: {} members x {} = {}",
            level.level, level.member_count, level.income_per_member, level.total_income
        ));
    }
    Ok(())
}

fn cmd_tree(
    container: &ServiceContainer,
    user_id: &str,
    max_levels: usize,
    out: OutputArgs,
) -> CliResult<()> {
    if out.json {
        return print_json(&container.network.build_tree(user_id, max_levels)?);
    }
    match container.network.materialize(user_id, max_levels)?.to_termtree() {
        Some(tree) => output::info(&tree),
        None => output::warning(&format!("no member {}", user_id)),
    }
    Ok(())
}

fn cmd_stats(
    container: &ServiceContainer,
    user_id: &str,
    max_levels: usize,
    out: OutputArgs,
) -> CliResult<()> {
    let stats = container.network.statistics(user_id, max_levels)?;
    if out.json {
        return print_json(&stats);
    }
    output::header(&format!("Dashboard of {}", user_id));
    output::action("Direct referrals", &stats.total_direct_referrals);
    output::action("Team members", &stats.total_team_members);
    output::action("Total income", &stats.total_income);
    for level in &stats.generation_levels {
        output::detail(&format!(
            "Level {}: {} members, {}",
            level.level, level.member_count, level.total_income
        ));
    }
    Ok(())
}

// ============================================================
// Config and completion
// ============================================================

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            let mark = |path: &std::path::Path| if path.exists() { "" } else { " (missing)" };
            match global_config_path() {
                Some(path) => output::action("global", &format!("{}{}", path.display(), mark(&path))),
                None => output::action("global", "unavailable"),
            }
            let dir = match &cli.project_dir {
                Some(dir) => dir.clone(),
                None => std::env::current_dir().map_err(|e| InfraError::io("get current directory", e))?,
            };
            let local = local_config_path(&dir);
            output::action("local", &format!("{}{}", local.display(), mark(&local)));
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}

fn cmd_completion(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

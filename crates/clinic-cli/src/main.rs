//! `clinic` command-line front end
//!
//! Every run works on fresh in-memory stores, seeded from `--seed-dir` (or the
//! configured seed source) before the command executes.

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use clinic_core::{Clinic, ClinicConfig, DashboardCounts, Entity};
use clinic_store::{FileSeedSource, Key};
use clinic_view::MemoryTarget;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("clinic")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Clinic records: seed stores, render views, log in")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("seed-dir")
                .long("seed-dir")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Directory of <entity>.json seed files"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("seed")
                .about("Seed stores and print a report per entity")
                .arg(
                    Arg::new("dir")
                        .long("dir")
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory of <entity>.json seed files"),
                ),
        )
        .subcommand(
            Command::new("render")
                .about("Render a table")
                .arg(
                    Arg::new("entity")
                        .required(true)
                        .value_parser(["appointments", "patients", "doctors", "medicines", "admins"])
                        .help("Table to render"),
                )
                .arg(
                    Arg::new("patient")
                        .long("patient")
                        .value_parser(value_parser!(i64))
                        .conflicts_with("search")
                        .help("Only appointments of this patient"),
                )
                .arg(
                    Arg::new("search")
                        .long("search")
                        .help("Only doctors whose first or last name contains this text"),
                ),
        )
        .subcommand(
            Command::new("counts").about("Show dashboard counts").arg(
                Arg::new("json")
                    .long("json")
                    .action(ArgAction::SetTrue)
                    .help("Print counts as JSON"),
            ),
        )
        .subcommand(
            Command::new("login")
                .about("Check a username and password")
                .arg(Arg::new("username").long("username").required(true))
                .arg(Arg::new("password").long("password").required(true))
                .arg(
                    Arg::new("create-admin")
                        .long("create-admin")
                        .value_parser(value_parser!(i64))
                        .help("First create the login of this admin id with the password"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(matches: &ArgMatches) -> Result<ClinicConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => {
            ClinicConfig::load(path).with_context(|| format!("loading {}", path.display()))
        }
        None => Ok(ClinicConfig::default()),
    }
}

async fn open_clinic(matches: &ArgMatches, seed_dir: Option<&PathBuf>) -> Result<Clinic> {
    let mut config = load_config(matches)?;
    if let Some(dir) = seed_dir {
        config.seed.dir = Some(dir.clone());
    }

    let clinic = Clinic::in_memory(config);
    if clinic.config().seed.source().is_some() {
        let reports = clinic.seed_from_config().await.context("seeding stores")?;
        debug!(entities = reports.len(), "Stores seeded");
    }
    Ok(clinic)
}

fn format_counts(counts: &DashboardCounts, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string(counts)?);
    }
    Ok(format!(
        "patients:     {}\ndoctors:      {}\nappointments: {}\nmedicines:    {}",
        counts.patients, counts.doctors, counts.appointments, counts.medicines
    ))
}

async fn run(matches: ArgMatches) -> Result<()> {
    let global_dir = matches.get_one::<PathBuf>("seed-dir");

    match matches.subcommand() {
        Some(("seed", args)) => {
            let dir = args
                .get_one::<PathBuf>("dir")
                .or(global_dir)
                .context("seed needs --dir")?;
            let clinic = Clinic::in_memory(load_config(&matches)?);
            let reports = clinic.seed_all(&FileSeedSource::new(dir.clone())).await?;
            for report in reports {
                println!(
                    "{:<12} fetched {:>4}  inserted {:>4}  skipped {:>4}  batches {:>3}",
                    report.entity, report.fetched, report.inserted, report.skipped, report.batches
                );
            }
        }
        Some(("render", args)) => {
            let clinic = open_clinic(&matches, global_dir).await?;
            let entity: Entity = args
                .get_one::<String>("entity")
                .context("entity is required")?
                .parse()
                .map_err(anyhow::Error::msg)?;

            let patient = args.get_one::<i64>("patient");
            let search = args.get_one::<String>("search");
            let definition = match (entity, patient, search) {
                (Entity::Appointments, Some(patient), _) => {
                    clinic.patient_appointments(Key::Int(*patient))
                }
                (_, Some(_), _) => bail!("--patient only applies to appointments"),
                (Entity::Doctors, None, Some(term)) => clinic.doctor_search(term),
                (_, None, Some(_)) => bail!("--search only applies to doctors"),
                (entity, None, None) => clinic
                    .table(entity)
                    .with_context(|| format!("{entity} has no table"))?,
            };

            let target = MemoryTarget::shared(format!("{entity}Table"));
            let view = clinic.bind(target.clone(), definition).await;
            println!("{}", target.render_text());
            if let Some(error) = target.error() {
                eprintln!("warning: {error}");
            }
            view.unbind();
        }
        Some(("counts", args)) => {
            let clinic = open_clinic(&matches, global_dir).await?;
            let counts = clinic.counts().await?;
            println!("{}", format_counts(&counts, args.get_flag("json"))?);
        }
        Some(("login", args)) => {
            let clinic = open_clinic(&matches, global_dir).await?;
            let username = args
                .get_one::<String>("username")
                .context("username is required")?;
            let password = args
                .get_one::<String>("password")
                .context("password is required")?;

            if let Some(admin) = args.get_one::<i64>("create-admin") {
                clinic
                    .create_admin_login(&Key::Int(*admin), password)
                    .await
                    .context("creating admin login")?;
            }

            match clinic.login(username, password).await {
                Ok(session) => println!("logged in as {} ({})", session.username, session.role),
                Err(err) => bail!("login failed: {err}"),
            }
        }
        _ => bail!("unknown command"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json-logs"));
    run(matches).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn render_accepts_known_tables_only() {
        assert!(cli()
            .try_get_matches_from(["clinic", "render", "patients"])
            .is_ok());
        assert!(cli()
            .try_get_matches_from(["clinic", "render", "admins"])
            .is_ok());
        assert!(cli()
            .try_get_matches_from(["clinic", "render", "logins"])
            .is_err());
    }

    #[test]
    fn counts_format_follows_its_own_flag() {
        let matches = cli()
            .try_get_matches_from(["clinic", "--json-logs", "counts"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert!(!args.get_flag("json"));

        let counts = DashboardCounts {
            patients: 3,
            doctors: 2,
            appointments: 1,
            medicines: 0,
        };
        assert!(format_counts(&counts, false)
            .unwrap()
            .starts_with("patients:     3\n"));

        let matches = cli()
            .try_get_matches_from(["clinic", "counts", "--json"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        let json = format_counts(&counts, args.get_flag("json")).unwrap();
        assert_eq!(
            json,
            r#"{"patients":3,"doctors":2,"appointments":1,"medicines":0}"#
        );
    }

    #[test]
    fn search_and_patient_filters_conflict() {
        assert!(cli()
            .try_get_matches_from(["clinic", "render", "doctors", "--search", "ada"])
            .is_ok());
        assert!(cli()
            .try_get_matches_from([
                "clinic", "render", "doctors", "--search", "ada", "--patient", "1"
            ])
            .is_err());
    }

    #[test]
    fn global_seed_dir_after_subcommand() {
        let matches = cli()
            .try_get_matches_from(["clinic", "counts", "--seed-dir", "seed"])
            .unwrap();
        assert_eq!(
            matches.get_one::<PathBuf>("seed-dir"),
            Some(&PathBuf::from("seed"))
        );
    }

    #[tokio::test]
    async fn render_seeded_medicines() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("medicines.json"),
            r#"[{"id":1,"Drug":"Aspirin"}]"#,
        )
        .unwrap();
        let matches = cli()
            .try_get_matches_from([
                "clinic",
                "--seed-dir",
                dir.path().to_str().unwrap(),
                "counts",
            ])
            .unwrap();

        let clinic = open_clinic(&matches, matches.get_one::<PathBuf>("seed-dir"))
            .await
            .unwrap();
        assert_eq!(clinic.counts().await.unwrap().medicines, 1);
    }
}

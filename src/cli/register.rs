use std::{fmt::Write as _, path::Path};

use anyhow::Context;
use chrono::Local;
use dialoguer::{Confirm, Input, Select};
use needboard::{
    enrich, Board, Config, Enrichment, Field, FileStore, KeyValueStore, Need, NeedForm, Notice,
    PostalLookup, Validation, ViaCep,
};
use tracing::instrument;

use crate::cli::{
    config_path, data_dir,
    lookup::create_spinner,
    terminal::{self, Colorize},
};

#[derive(Debug, Default, clap::Parser)]
pub struct Register {
    /// Prompt for each field, pre-filled with any values given as options
    #[arg(long, short)]
    interactive: bool,

    /// Do not fill in the address from the postal code
    #[arg(long)]
    no_lookup: bool,

    /// Name of the institution asking for help
    #[arg(long)]
    institution: Option<String>,

    /// Aid type, one of the configured categories
    #[arg(long, short = 't')]
    aid_type: Option<String>,

    /// Short title of the need
    #[arg(long)]
    title: Option<String>,

    /// What is needed, and for whom
    #[arg(long, short)]
    description: Option<String>,

    /// Postal code; used to fill in the address
    #[arg(long, short)]
    postal_code: Option<String>,

    /// Street and number (overrides the looked up value)
    #[arg(long)]
    street: Option<String>,

    /// District (overrides the looked up value)
    #[arg(long)]
    district: Option<String>,

    /// City (overrides the looked up value)
    #[arg(long)]
    city: Option<String>,

    /// State (overrides the looked up value)
    #[arg(long)]
    state: Option<String>,

    /// E-mail address or phone number
    #[arg(long, short)]
    contact: Option<String>,
}

impl Register {
    #[instrument(skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let config = Config::load_or_default(&config_path(root));
        let lookup = if self.no_lookup {
            None
        } else {
            Some(ViaCep::new(&config)?)
        };

        let mut board = Board::open(FileStore::new(data_dir(root)))
            .context("failed to load the needs collection")?;

        if self.interactive {
            self.run_interactive(&config, lookup.as_ref(), &mut board)
        } else {
            let form = self.form_from_args(lookup.as_ref());
            let validation = check(&form, &config);
            if !validation.is_valid() {
                report(&validation);
                anyhow::bail!("need not registered: the form has invalid fields");
            }
            commit(&form, &config, &mut board)
        }
    }

    /// Build the form from command-line options.
    ///
    /// The postal code lookup runs before the address options are applied,
    /// so explicit values win over looked up ones.
    fn form_from_args<L: PostalLookup>(&self, lookup: Option<&L>) -> NeedForm {
        let mut form = NeedForm::default();
        for field in [
            Field::Institution,
            Field::AidType,
            Field::Title,
            Field::Description,
            Field::PostalCode,
            Field::Contact,
        ] {
            if let Some(value) = self.arg(field) {
                form.set(field, value);
            }
        }

        if let Some(lookup) = lookup {
            lookup_address(&mut form, lookup);
        }

        for field in Field::ADDRESS {
            if let Some(value) = self.arg(field) {
                form.set(field, value);
            }
        }

        form
    }

    fn run_interactive<L: PostalLookup, S: KeyValueStore>(
        &self,
        config: &Config,
        lookup: Option<&L>,
        board: &mut Board<S>,
    ) -> anyhow::Result<()> {
        let mut form = NeedForm::default();
        for field in Field::REQUIRED {
            if let Some(value) = self.arg(field) {
                form.set(field, value);
            }
        }

        loop {
            prompt_form(&mut form, config, lookup)?;

            let validation = check(&form, config);
            if !validation.is_valid() {
                report(&validation);
                if Confirm::new()
                    .with_prompt("Correct the form?")
                    .default(true)
                    .interact()?
                {
                    continue;
                }
                anyhow::bail!("need not registered: the form has invalid fields");
            }

            commit(&form, config, board)?;
            form.reset();

            if !Confirm::new()
                .with_prompt("Register another need?")
                .default(false)
                .interact()?
            {
                return Ok(());
            }
        }
    }

    fn arg(&self, field: Field) -> Option<&str> {
        match field {
            Field::Institution => self.institution.as_deref(),
            Field::AidType => self.aid_type.as_deref(),
            Field::Title => self.title.as_deref(),
            Field::Description => self.description.as_deref(),
            Field::PostalCode => self.postal_code.as_deref(),
            Field::Street => self.street.as_deref(),
            Field::District => self.district.as_deref(),
            Field::City => self.city.as_deref(),
            Field::State => self.state.as_deref(),
            Field::Contact => self.contact.as_deref(),
        }
    }
}

/// Prompt for every field in form order, offering the current values.
///
/// The lookup runs as soon as the postal code is entered, and the address
/// prompts that follow start from its result.
fn prompt_form<L: PostalLookup>(
    form: &mut NeedForm,
    config: &Config,
    lookup: Option<&L>,
) -> anyhow::Result<()> {
    for field in Field::REQUIRED {
        let value = if field == Field::AidType && !config.aid_types().is_empty() {
            select_aid_type(config, form.value(field))?
        } else {
            prompt_text(field, form.value(field))?
        };
        form.set(field, value);

        if field == Field::PostalCode {
            if let Some(lookup) = lookup {
                lookup_address(form, lookup);
            }
        }
    }
    Ok(())
}

fn prompt_text(field: Field, current: &str) -> anyhow::Result<String> {
    let mut input = Input::<String>::new()
        .with_prompt(field.label())
        .allow_empty(true);
    if !current.is_empty() {
        input = input.with_initial_text(current);
    }
    Ok(input.interact_text()?)
}

fn select_aid_type(config: &Config, current: &str) -> anyhow::Result<String> {
    let aid_types = config.aid_types();
    let default = aid_types.iter().position(|t| t == current).unwrap_or(0);
    let index = Select::new()
        .with_prompt(Field::AidType.label())
        .items(aid_types)
        .default(default)
        .interact()?;
    Ok(aid_types[index].clone())
}

/// Fill in the address from the postal code, telling the user if that
/// fails.
fn lookup_address<L: PostalLookup>(form: &mut NeedForm, lookup: &L) {
    let Some(code) = form.postal_code() else {
        return;
    };

    let spinner = create_spinner(&format!("Looking up {code}"));
    let outcome = enrich(form, lookup);
    spinner.finish_and_clear();

    if let Enrichment::Filled(address) = &outcome {
        let line = format!(
            "Address: {}, {}, {} - {}",
            address.street, address.district, address.city, address.state
        );
        println!("{}", line.dim());
    }
    if let Some(notice) = outcome.notice() {
        terminal::notify(&notice);
    }
}

/// Validate the form, and check the aid type against the configured list.
fn check(form: &NeedForm, config: &Config) -> Validation {
    let mut validation = form.validate();
    if !validation.is_invalid(Field::AidType) && !config.is_aid_type_allowed(&form.aid_type) {
        tracing::debug!("aid type {:?} is not configured", form.aid_type);
        validation.mark_invalid(Field::AidType);
        eprintln!(
            "{}",
            format!(
                "Unknown aid type '{}'. Expected one of: {}",
                form.aid_type,
                config.aid_types().join(", ")
            )
            .warning()
        );
    }
    validation
}

/// Show which fields are invalid, then any notices.
fn report(validation: &Validation) {
    eprintln!("{}", "The form has invalid fields:".error());
    for field in validation.invalid_fields() {
        eprintln!("  {}", format!("✗ {}", field.label()).error());
    }
    for notice in validation.notices() {
        terminal::notify(notice);
    }
}

fn commit<S: KeyValueStore>(
    form: &NeedForm,
    config: &Config,
    board: &mut Board<S>,
) -> anyhow::Result<()> {
    let need = Need::from_form(form, today(&config.date_format)?)?;
    let need = board.register(need)?;

    terminal::notify(&Notice::Registered);
    println!("{}", format!("id: {}", need.id()).dim());
    Ok(())
}

/// Today's date in the configured format.
fn today(format: &str) -> anyhow::Result<String> {
    let mut date = String::new();
    write!(date, "{}", Local::now().format(format))
        .map_err(|_| anyhow::anyhow!("invalid date_format in config: {format:?}"))?;
    Ok(date)
}

#[cfg(test)]
mod tests {
    use needboard::{domain::ResolvedAddress, LookupError, PostalCode};
    use tempfile::tempdir;

    use super::*;

    /// Resolves every postal code to the same address.
    struct FixedLookup(ResolvedAddress);

    impl PostalLookup for FixedLookup {
        fn lookup(&self, _code: &PostalCode) -> Result<Option<ResolvedAddress>, LookupError> {
            Ok(Some(self.0.clone()))
        }
    }

    fn se() -> FixedLookup {
        FixedLookup(ResolvedAddress {
            street: "Praça da Sé".to_string(),
            district: "Sé".to_string(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
        })
    }

    fn without_address() -> Register {
        Register {
            institution: Some("Casa de Apoio".to_string()),
            aid_type: Some("Food".to_string()),
            title: Some("Winter coats".to_string()),
            description: Some("Coats for forty children".to_string()),
            postal_code: Some("01001-000".to_string()),
            contact: Some("contato@casa.org".to_string()),
            ..Register::default()
        }
    }

    fn complete() -> Register {
        Register {
            street: Some("Praça da Sé".to_string()),
            district: Some("Sé".to_string()),
            city: Some("São Paulo".to_string()),
            state: Some("SP".to_string()),
            no_lookup: true,
            ..without_address()
        }
    }

    #[test]
    fn lookup_fills_the_address() {
        let form = without_address().form_from_args(Some(&se()));

        assert_eq!(form.street, "Praça da Sé");
        assert_eq!(form.city, "São Paulo");
        assert!(form.validate().is_valid());
    }

    #[test]
    fn explicit_address_values_win_over_the_lookup() {
        let register = Register {
            street: Some("Rua Nova, 12".to_string()),
            state: Some("sp".to_string()),
            ..without_address()
        };

        let form = register.form_from_args(Some(&se()));

        assert_eq!(form.street, "Rua Nova, 12");
        assert_eq!(form.state, "sp");
        assert_eq!(form.district, "Sé");
        assert_eq!(form.city, "São Paulo");
    }

    #[test]
    fn without_lookup_the_address_stays_blank() {
        let form = without_address().form_from_args::<FixedLookup>(None);

        let validation = form.validate();
        for field in Field::ADDRESS {
            assert!(validation.is_invalid(field), "{field} should be blank");
        }
    }

    #[test]
    fn check_rejects_unconfigured_aid_type() {
        let config = Config::default();
        let mut form = complete().form_from_args::<FixedLookup>(None);
        assert!(check(&form, &config).is_valid());

        form.aid_type = "Toys".to_string();
        let validation = check(&form, &config);
        assert_eq!(validation.invalid_fields().collect::<Vec<_>>(), [Field::AidType]);
    }

    #[test]
    fn check_accepts_any_aid_type_when_none_configured() {
        let config: Config = toml::from_str("_version = \"1\"\naid_types = []\n").unwrap();
        let mut form = complete().form_from_args::<FixedLookup>(None);
        form.aid_type = "Toys".to_string();

        assert!(check(&form, &config).is_valid());
    }

    #[test]
    fn today_uses_the_configured_format() {
        let year = today("%Y").unwrap();
        assert_eq!(year.len(), 4);
        assert!(year.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn today_reports_invalid_format() {
        let err = today("%").unwrap_err();
        assert!(err.to_string().contains("invalid date_format"));
    }

    #[test]
    fn run_registers_need_from_flags() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();

        complete().run(&root).expect("register should succeed");
        complete().run(&root).expect("second register should succeed");

        let board = Board::open(FileStore::new(data_dir(&root))).unwrap();
        assert_eq!(board.needs().len(), 2);
        assert_eq!(board.revision(), 2);
        assert_eq!(board.needs()[0].title(), "Winter coats");
    }

    #[test]
    fn run_rejects_invalid_form_and_writes_nothing() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();

        let register = Register {
            contact: Some("call us".to_string()),
            ..complete()
        };
        assert!(register.run(&root).is_err());

        let board = Board::open(FileStore::new(data_dir(&root))).unwrap();
        assert!(board.needs().is_empty());
    }

    #[test]
    fn run_refuses_to_overwrite_corrupt_data() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        let data = data_dir(&root);
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(data.join("needs.json"), "{not json").unwrap();

        assert!(complete().run(&root).is_err());
        assert_eq!(
            std::fs::read_to_string(data.join("needs.json")).unwrap(),
            "{not json"
        );
    }
}

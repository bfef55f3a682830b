mod args;


use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use ldap_people::{
    AttributeSelection, Command, CommandOutput, DirectoryConfig, LdapConnector, MemoryCache,
    PeopleDirectory, Projection,
};
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::args::{Credentials, Mode, Opts};


fn load_config(opts: &Opts) -> DirectoryConfig {
    let mut config = DirectoryConfig::load(&opts.config)
        .expect("failed to load configuration");

    // obtain credentials
    if let Some(credentials_file) = &opts.credentials_file {
        let credentials_string = std::fs::read_to_string(credentials_file)
            .expect("failed to read credentials file");
        let credentials: Credentials = toml::from_str(&credentials_string)
            .expect("failed to parse credentials file");
        config.binddn = credentials.bind_dn;
        config.bindpassword = Some(credentials.password);
    } else if opts.bind_password_prompt {
        let password = rpassword::prompt_password(format!("LDAP password for {}: ", config.binddn))
            .expect("failed to read LDAP password");
        config.bindpassword = Some(password);
    }

    config
}


fn print_projection(projection: &Projection) {
    match projection {
        Projection::Scalar(value) => println!("{}", value),
        Projection::Table(_) => {
            let rendered = toml::to_string(projection)
                .expect("failed to render result");
            print!("{}", rendered);
        },
    }
}


async fn run(opts: Opts) -> ExitCode {
    let config = load_config(&opts);

    let command = match &opts.mode {
        Mode::People(people_opts) => {
            Command::from_name("people", &people_opts.usernames)
                .map(|c| c.with_attributes(AttributeSelection::from(people_opts.attributes.as_deref())))
        },
        Mode::Auth(auth_opts) => {
            let password = rpassword::prompt_password(format!("password for {}: ", auth_opts.userid))
                .expect("failed to read password");
            Command::from_name("auth", &[auth_opts.userid.as_str(), password.as_str()])
        },
    };
    let command = match command {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(2);
        },
    };

    let mut directory = match PeopleDirectory::new(config, LdapConnector::new(), Arc::new(MemoryCache::new())) {
        Ok(d) => d,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(2);
        },
    };

    let result = directory.execute(command).await;
    if let Err(e) = directory.close().await {
        error!("{}", e);
    }

    match result {
        Ok(CommandOutput::People(projection)) => {
            print_projection(&projection);
            ExitCode::SUCCESS
        },
        Ok(CommandOutput::Auth(authenticated)) => {
            println!("{}", authenticated);
            if authenticated { ExitCode::SUCCESS } else { ExitCode::FAILURE }
        },
        Err(e) => {
            error!("{}", e);
            ExitCode::from(2)
        },
    }
}


#[tokio::main]
async fn main() -> ExitCode {
    let opts = Opts::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&opts.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    run(opts).await
}

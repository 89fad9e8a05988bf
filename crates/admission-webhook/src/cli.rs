use clap::builder::PossibleValue;
use clap::{Arg, ArgAction, Command, crate_authors, crate_description, crate_name, crate_version};

pub fn build_cli() -> Command {
    let mut args = vec![
        Arg::new("log-level")
            .long("log-level")
            .value_name("LOG_LEVEL")
            .env("ADMISSION_WEBHOOK_LOG_LEVEL")
            .default_value("info")
            .value_parser([
                PossibleValue::new("trace"),
                PossibleValue::new("debug"),
                PossibleValue::new("info"),
                PossibleValue::new("warn"),
                PossibleValue::new("error"),
            ])
            .help("Log level"),
        Arg::new("log-fmt")
            .long("log-fmt")
            .value_name("LOG_FMT")
            .env("ADMISSION_WEBHOOK_LOG_FMT")
            .default_value("text")
            .value_parser([PossibleValue::new("text"), PossibleValue::new("json")])
            .help("Log output format"),
        Arg::new("log-no-color")
            .long("log-no-color")
            .env("NO_COLOR")
            .action(ArgAction::SetTrue)
            .help("Disable colored output for logs"),
        Arg::new("address")
            .long("addr")
            .value_name("BIND_ADDRESS")
            .default_value("0.0.0.0")
            .env("ADMISSION_WEBHOOK_BIND_ADDRESS")
            .help("Bind against ADDRESS"),
        Arg::new("port")
            .long("port")
            .value_name("PORT")
            .default_value("8443")
            .env("ADMISSION_WEBHOOK_PORT")
            .help("Listen on PORT"),
        Arg::new("cert-file")
            .long("cert-file")
            .value_name("CERT_FILE")
            .default_value("")
            .env("ADMISSION_WEBHOOK_CERT_FILE")
            .help("Path to an X.509 certificate file for HTTPS"),
        Arg::new("key-file")
            .long("key-file")
            .value_name("KEY_FILE")
            .default_value("")
            .env("ADMISSION_WEBHOOK_KEY_FILE")
            .help("Path to an X.509 private key file for HTTPS"),
        Arg::new("webhooks")
            .long("webhooks")
            .value_name("WEBHOOKS")
            .env("ADMISSION_WEBHOOK_WEBHOOKS")
            .default_value("all")
            .value_parser([
                PossibleValue::new("all"),
                PossibleValue::new("validate"),
                PossibleValue::new("mutate"),
            ])
            .help("Admission endpoints to serve"),
        Arg::new("allowed-registry")
            .long("allowed-registry")
            .value_name("REGISTRY")
            .env("ADMISSION_WEBHOOK_ALLOWED_REGISTRY")
            .default_value(admission_core::validating::DEFAULT_ALLOWED_REGISTRY)
            .help("Prefix every container image must start with"),
        Arg::new("default-cpu-limit")
            .long("default-cpu-limit")
            .value_name("QUANTITY")
            .env("ADMISSION_WEBHOOK_DEFAULT_CPU_LIMIT")
            .default_value(admission_core::mutating::DEFAULT_CPU_LIMIT)
            .help("CPU limit given to containers that do not declare limits"),
        Arg::new("default-memory-limit")
            .long("default-memory-limit")
            .value_name("QUANTITY")
            .env("ADMISSION_WEBHOOK_DEFAULT_MEMORY_LIMIT")
            .default_value(admission_core::mutating::DEFAULT_MEMORY_LIMIT)
            .help("Memory limit given to containers that do not declare limits"),
        Arg::new("resource-group")
            .long("resource-group")
            .value_name("GROUP")
            .env("ADMISSION_WEBHOOK_RESOURCE_GROUP")
            .default_value("")
            .help("API group of the guarded resource"),
        Arg::new("resource-version")
            .long("resource-version")
            .value_name("VERSION")
            .env("ADMISSION_WEBHOOK_RESOURCE_VERSION")
            .default_value("v1")
            .help("API version of the guarded resource"),
        Arg::new("resource")
            .long("resource")
            .value_name("RESOURCE")
            .env("ADMISSION_WEBHOOK_RESOURCE")
            .default_value("pods")
            .help("Plural name of the guarded resource (pods, deployments, replicasets, statefulsets, daemonsets, jobs)"),
    ];
    args.sort_by(|a, b| a.get_id().cmp(b.get_id()));

    Command::new(crate_name!())
        .author(crate_authors!())
        .version(crate_version!())
        .about(crate_description!())
        .args(args)
}

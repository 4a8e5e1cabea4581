#[cfg(test)]
pub mod test {
    use serde::Deserialize;
    use toml::Table;

    use crate::schema::{Schema, Shape};

    /// Flat schema where every field can become a flag.
    pub fn server_schema() -> Schema {
        Schema::object(server_shape())
    }

    fn server_shape() -> Shape {
        Shape::new()
            .field("host", Schema::string().describe("The application host."))
            .field("port", Schema::number().describe("The port number.").default(8080))
            .field("verbose", Schema::boolean().optional())
            .field("tags", Schema::array(Schema::string()).optional())
            .field(
                "level",
                Schema::enumeration(["debug", "info", "warn", "error"]).optional(),
            )
    }

    /// Server fields plus config-only sections.
    pub fn app_schema() -> Schema {
        let database = Shape::new()
            .field("url", Schema::string().describe("Connection string URL.").optional())
            .field("pool_size", Schema::number().default(5));
        let mut shape = server_shape();
        shape.insert("database", Schema::object(database).default(Table::new()));
        shape.insert("labels", Schema::record(Schema::string()).optional());
        Schema::object(shape)
    }

    #[derive(Deserialize, Debug, PartialEq)]
    pub struct AppConfig {
        pub host: String,
        pub port: u16,
        pub verbose: Option<bool>,
        #[serde(default)]
        pub tags: Vec<String>,
        pub level: Option<String>,
        pub database: DbConfig,
    }

    #[derive(Deserialize, Debug, PartialEq)]
    pub struct DbConfig {
        pub url: Option<String>,
        pub pool_size: usize,
    }

    #[test]
    fn app_schema_fills_nested_defaults() {
        let mut input = Table::new();
        input.insert("host".into(), "localhost".into());
        let out = app_schema().validate_table(&input).unwrap();
        assert_eq!(out["port"].as_integer(), Some(8080));
        assert_eq!(out["database"]["pool_size"].as_integer(), Some(5));
    }
}

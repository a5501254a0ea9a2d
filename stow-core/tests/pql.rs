#[cfg(test)]
mod tests {
    use indoc::indoc;
    use stow_core::{is_template, pql};

    fn available() -> Vec<String> {
        ["id", "name", "description", "created_at"]
            .map(String::from)
            .to_vec()
    }

    fn expand(template: &str) -> pql::Query {
        pql::parse(template, &available())
            .unwrap_or_else(|e| panic!("Could not expand `{template}`: {e:#}"))
    }

    fn template_error(template: &str) -> String {
        let error = pql::parse(template, &available()).unwrap_err();
        assert!(is_template(&error), "{error:#}");
        error.to_string()
    }

    #[test]
    fn no_regions() {
        let query = expand("SELECT 1");
        assert_eq!(query.sql, "SELECT 1");
        assert!(query.columns.is_empty());
    }

    #[test]
    fn quoted_text_is_left_alone() {
        let query = expand(r#"select "'*" 'YES\'\\' from { * } yeah..."#);
        assert_eq!(
            query.sql,
            r#"select "'*" 'YES\'\\' from id, name, description, created_at yeah..."#
        );
        assert_eq!(query.columns, available());

        let query = expand("select '{not, a, region}' from {id}");
        assert_eq!(query.sql, "select '{not, a, region}' from id");
        assert_eq!(query.columns, ["id"]);
    }

    #[test]
    fn escaped_braces() {
        let query = expand(r"select \{ id \} from t");
        assert_eq!(query.sql, r"select \{ id \} from t");
        assert!(query.columns.is_empty());

        let query = expand(r"select \\{id} from t");
        assert_eq!(query.sql, r"select \\id from t");
    }

    #[test]
    fn explicit_list() {
        let query = expand("{ ok, yes, that }");
        assert_eq!(query.sql, "ok, yes, that");
        assert_eq!(query.columns, ["ok", "yes", "that"]);
    }

    #[test]
    fn wildcard() {
        let query = expand("SELECT {*} FROM products");
        assert_eq!(
            query.sql,
            "SELECT id, name, description, created_at FROM products"
        );
        assert_eq!(query.columns, available());
    }

    #[test]
    fn qualified_wildcard() {
        let query = expand("SELECT {p.*} FROM products p");
        assert_eq!(
            query.sql,
            "SELECT p.id, p.name, p.description, p.created_at FROM products p"
        );
        assert_eq!(query.columns, available());
    }

    #[test]
    fn qualified_list() {
        let query = expand("SELECT {p.id, p.name} FROM products p WHERE p.id = $1");
        assert_eq!(
            query.sql,
            "SELECT p.id, p.name FROM products p WHERE p.id = $1"
        );
        assert_eq!(query.columns, ["id", "name"]);
    }

    #[test]
    fn single_column() {
        let query = expand("SELECT {id} FROM products");
        assert_eq!(query.sql, "SELECT id FROM products");
        assert_eq!(query.columns, ["id"]);
    }

    #[test]
    fn multiple_regions() {
        let query = expand(indoc! {"
            SELECT {p.id}, {q.name, q.description}
            FROM products p JOIN products q ON q.id = p.id
        "});
        assert_eq!(
            query.sql,
            indoc! {"
                SELECT p.id, q.name, q.description
                FROM products p JOIN products q ON q.id = p.id
            "}
        );
        assert_eq!(query.columns, ["id", "name", "description"]);
    }

    #[test]
    fn malformed_regions() {
        assert!(template_error("{}").contains("Invalid token"));
        assert!(template_error("{ ok \"\\}\" }").contains("Syntax error"));
        assert!(template_error("{p.id, p.*}").contains("unexpected wildcard"));
        assert!(template_error("{*, id}").contains("unexpected wildcard"));
        assert!(template_error("{*.id}").contains("Cannot dereference"));
        assert!(template_error("{a b}").contains("Invalid token"));
        assert!(template_error("{a.}").contains("Invalid token"));
        assert!(template_error("{a, }").contains("Invalid token"));
    }

    #[test]
    fn unbalanced() {
        assert!(template_error("SELECT {id FROM t").contains("never closed"));
        assert!(template_error("SELECT id} FROM t").contains("never opened"));
        assert!(template_error("SELECT {{id}} FROM t").contains("more than once"));
        assert!(template_error("SELECT 'abc FROM t").contains("Quote sequence never closed"));
    }

    #[test]
    fn error_points_at_the_problem() {
        let message = template_error("SELECT {id FROM t");
        let lines: Vec<&str> = message.lines().collect();
        assert_eq!(lines[1], "  SELECT {id FROM t");
        assert_eq!(lines[2], "         ^^^^^^^^^^");
    }
}

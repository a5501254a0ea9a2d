#[cfg(test)]
mod tests {
    use stow::{
        AsValue, Dest, ForeignEntity, MappingCache, Operation, PersistError, Record, Scanner,
        Value, is_configuration,
    };
    use uuid::Uuid;

    #[derive(Debug, Default, Clone, PartialEq, Record)]
    struct Valid {
        #[stow(column = "a,pk")]
        a: Option<Uuid>,
        #[stow(column = "b")]
        b: String,
        #[stow(column = "c,ro")]
        c: i64,
    }

    #[derive(Debug, Default, Clone, PartialEq, Record)]
    struct Reference {
        #[stow(column = "f,pk")]
        f: Uuid,
        #[stow(column = "g")]
        g: i32,
    }

    impl ForeignEntity for Reference {
        fn foreign_key(&self) -> Value {
            self.f.as_value()
        }
    }

    #[derive(Debug, Default, Clone, PartialEq, Record)]
    struct Inline {
        #[stow(column = "h_a")]
        ha: bool,
        #[stow(column = "h_b")]
        hb: String,
    }

    #[derive(Debug, Default, Clone, PartialEq, Record)]
    struct Embedding {
        #[stow(embed)]
        valid: Valid,
        #[stow(column = "d")]
        d: bool,
        #[stow(column = "e,fk")]
        e: Option<Box<Reference>>,
        #[stow(column = ",inline")]
        h: Inline,
    }

    #[derive(Debug, Default, Clone, PartialEq, Record)]
    struct Another {
        #[stow(column = "a,pk")]
        a: Option<Uuid>,
        #[stow(column = "prefix_,inline")]
        b: Option<Box<Inline>>,
    }

    #[derive(Debug, Default, Clone, PartialEq, Record)]
    struct EmptyName {
        #[stow(embed, column = "-")]
        inline: Inline,
        #[stow(column = "a,pk")]
        a: Option<Uuid>,
        #[stow(column = "-")]
        x: bool,
        #[stow(column = "b")]
        b: String,
        unmapped: Vec<String>,
    }

    fn sorted(mut names: Vec<String>) -> Vec<String> {
        names.sort();
        names
    }

    fn text(value: &str) -> Value {
        Value::Varchar(Some(value.into()))
    }

    #[test]
    fn plain_columns() {
        let cache = MappingCache::new();
        let mut value = Valid {
            a: None,
            b: "B".into(),
            c: 123,
        };
        let mut scanner = Scanner::new(&cache, &mut value).unwrap();
        assert_eq!(scanner.primary_keys(), ["a"]);
        assert_eq!(scanner.properties(), ["b", "c"]);
        assert!(scanner.id().unwrap().is_empty());

        let id = Uuid::new_v4();
        scanner.set_id(id).unwrap();
        assert_eq!(scanner.id().unwrap(), Value::Uuid(Some(id)));

        let fresh = scanner.new_id().unwrap();
        assert!(matches!(fresh, Value::Uuid(Some(v)) if v != id && !v.is_nil()));

        let read = scanner.values(true, Operation::Read).unwrap();
        assert_eq!(read.len(), 3);
        assert_eq!(read.get("a"), Some(&Value::Uuid(Some(id))));
        assert_eq!(read.get("b"), Some(&text("B")));
        assert_eq!(read.get("c"), Some(&Value::Int64(Some(123))));

        let write = scanner.values(false, Operation::Write).unwrap();
        assert_eq!(write.keys().collect::<Vec<_>>(), ["b"]);

        let names = ["a", "b", "c"].map(String::from);
        let dests = scanner.dests(&names).unwrap();
        let other = Uuid::new_v4();
        let extra = scanner
            .scan(
                &dests,
                [Value::Uuid(Some(other)), text("Z"), Value::Int32(Some(987))],
            )
            .unwrap();
        assert!(extra.is_empty());
        assert_eq!(
            value,
            Valid {
                a: Some(other),
                b: "Z".into(),
                c: 987,
            }
        );
    }

    #[test]
    fn embedded_and_foreign() {
        let cache = MappingCache::new();
        let reference = Uuid::new_v4();
        let mut value = Embedding {
            valid: Valid {
                a: None,
                b: "Z".into(),
                c: 987,
            },
            d: false,
            e: Some(Box::new(Reference { f: reference, g: 999 })),
            h: Inline {
                ha: true,
                hb: "R".into(),
            },
        };
        let mapping = cache.mapping::<Embedding>().unwrap();
        assert_eq!(mapping.primary_keys(), ["a"]);
        assert_eq!(
            sorted(mapping.properties()),
            ["b", "c", "d", "e", "h_a", "h_b"]
        );
        assert_eq!(mapping.columns()[0], "a");

        let id = Uuid::new_v4();
        mapping.set_id(&mut value, Value::Uuid(Some(id))).unwrap();
        assert_eq!(value.valid.a, Some(id));
        assert_eq!(mapping.id(&value).unwrap(), Value::Uuid(Some(id)));
        assert!(!mapping.new_id().unwrap().is_empty());

        let read = mapping.values(&value, true, Operation::Read).unwrap();
        assert_eq!(
            read.keys().cloned().collect::<Vec<_>>(),
            ["a", "b", "c", "d", "e", "h_a", "h_b"]
        );
        assert_eq!(read.get("e"), Some(&Value::Uuid(Some(reference))));
        assert_eq!(read.get("h_a"), Some(&Value::Boolean(Some(true))));

        let write = mapping.values(&value, false, Operation::Write).unwrap();
        assert_eq!(
            write.keys().cloned().collect::<Vec<_>>(),
            ["b", "d", "e", "h_a", "h_b"]
        );

        let names = ["a", "b", "c", "d", "e", "h_a", "h_b"].map(String::from);
        let dests = mapping.dests(&names).unwrap();
        assert_eq!(dests.dests()[0], Dest::Field(vec![0, 0]));
        assert_eq!(dests.dests()[4], Dest::Foreign);
        assert_eq!(dests.dests()[5], Dest::Field(vec![3, 0]));
        let other = Uuid::new_v4();
        let extra = dests
            .scan(
                &mut value,
                [
                    Value::Uuid(Some(id)),
                    text("B"),
                    Value::Int64(Some(123)),
                    Value::Boolean(Some(true)),
                    Value::Uuid(Some(other)),
                    Value::Boolean(Some(false)),
                    text("S"),
                ],
            )
            .unwrap()
            .deref_values();
        assert_eq!(value.valid.b, "B");
        assert_eq!(value.valid.c, 123);
        assert!(value.d);
        assert_eq!(value.h, Inline { ha: false, hb: "S".into() });
        assert_eq!(
            value.e.as_ref().map(|v| v.f),
            Some(reference),
            "foreign keys are captured, not written"
        );
        assert_eq!(extra.get("e"), Some(&Value::Uuid(Some(other))));

        value.e = None;
        let write = mapping.values(&value, false, Operation::Write).unwrap();
        assert!(!write.contains("e"));
    }

    #[test]
    fn inline_prefix() {
        let cache = MappingCache::new();
        let id = Uuid::new_v4();
        let mut value = Another {
            a: Some(id),
            b: Some(Box::new(Inline {
                ha: true,
                hb: "Inline tester".into(),
            })),
        };
        let mapping = cache.mapping::<Another>().unwrap();
        assert_eq!(mapping.primary_keys(), ["a"]);
        assert_eq!(mapping.properties(), ["prefix_h_a", "prefix_h_b"]);

        let read = mapping.values(&value, true, Operation::Read).unwrap();
        assert_eq!(read.get("prefix_h_b"), Some(&text("Inline tester")));

        let names = ["a", "prefix_h_a", "prefix_h_b"].map(String::from);
        let dests = mapping.dests(&names).unwrap();
        assert_eq!(dests.len(), 3);
        dests
            .scan(
                &mut value,
                [Value::Uuid(Some(id)), Value::Boolean(Some(false)), text("Z")],
            )
            .unwrap();
        assert_eq!(
            value.b.as_deref(),
            Some(&Inline {
                ha: false,
                hb: "Z".into()
            })
        );
    }

    #[test]
    fn missing_inline_is_allocated() {
        let cache = MappingCache::new();
        let id = Uuid::new_v4();
        let mut value = Another {
            a: Some(id),
            b: None,
        };
        let mapping = cache.mapping::<Another>().unwrap();
        let read = mapping.values(&value, true, Operation::Read).unwrap();
        assert_eq!(read.keys().cloned().collect::<Vec<_>>(), ["a"]);

        let names = ["a", "prefix_h_a", "prefix_h_b"].map(String::from);
        mapping
            .dests(&names)
            .unwrap()
            .scan(
                &mut value,
                [Value::Uuid(Some(id)), Value::Boolean(Some(true)), text("A")],
            )
            .unwrap();
        assert_eq!(
            value.b.as_deref(),
            Some(&Inline {
                ha: true,
                hb: "A".into()
            })
        );
    }

    #[test]
    fn excluded_fields() {
        let cache = MappingCache::new();
        let id = Uuid::new_v4();
        let value = EmptyName {
            inline: Inline {
                ha: true,
                hb: "HB".into(),
            },
            a: Some(id),
            x: false,
            b: "B".into(),
            unmapped: vec!["ignored".into()],
        };
        let mapping = cache.mapping::<EmptyName>().unwrap();
        assert_eq!(mapping.primary_keys(), ["a"]);
        assert_eq!(mapping.properties(), ["b"]);
        let read = mapping.values(&value, true, Operation::Read).unwrap();
        assert_eq!(read.keys().cloned().collect::<Vec<_>>(), ["a", "b"]);
        assert!(mapping.embeds().is_empty());
    }

    #[test]
    fn unknown_columns() {
        let cache = MappingCache::new();
        let mapping = cache.mapping::<Valid>().unwrap();
        let names = ["a", "zzz", "b", "yyy"].map(String::from);
        let error = mapping.dests(&names).unwrap_err();
        match PersistError::kind_of(&error) {
            Some(PersistError::UnknownColumns { type_name, columns }) => {
                assert_eq!(*type_name, "Valid");
                assert_eq!(columns, &["zzz", "yyy"]);
            }
            other => panic!("Unexpected error kind: {other:?}"),
        }
    }

    #[test]
    fn circular_embedding() {
        #[derive(Default, Record)]
        struct Node {
            #[stow(column = "id,pk")]
            id: Option<Uuid>,
            #[stow(column = "next_,inline")]
            next: Option<Box<Node>>,
        }
        let cache = MappingCache::new();
        let error = cache.mapping::<Node>().unwrap_err();
        assert!(is_configuration(&error));
        assert!(error.to_string().contains("Circular"), "{error}");
        assert!(cache.is_empty());
        assert!(cache.mapping::<Node>().is_err());
    }

    #[test]
    fn transitive_circular_embedding() {
        #[derive(Default, Record)]
        struct Outer {
            #[stow(column = "id,pk")]
            id: Option<Uuid>,
            #[stow(column = "inner_,inline")]
            inner: Option<Box<Middle>>,
        }
        #[derive(Default, Record)]
        struct Middle {
            #[stow(column = "label")]
            label: String,
            #[stow(column = "outer_,inline")]
            outer: Option<Box<Outer>>,
        }
        let cache = MappingCache::new();
        let error = cache.mapping::<Outer>().unwrap_err();
        assert!(is_configuration(&error), "{error:#}");
        assert!(error.to_string().contains("Circular"), "{error}");
        assert!(cache.is_empty());
        assert!(is_configuration(&cache.mapping::<Middle>().unwrap_err()));
        assert!(cache.is_empty());
    }

    #[test]
    fn nested_inline_levels() {
        #[derive(Debug, Default, Clone, PartialEq, Record)]
        struct Leaf {
            #[stow(column = "id,pk")]
            id: Option<Uuid>,
            #[stow(column = "x")]
            x: i32,
        }
        #[derive(Debug, Default, Clone, PartialEq, Record)]
        struct Branch {
            #[stow(column = "y")]
            y: String,
            #[stow(column = "c_,inline")]
            leaf: Option<Box<Leaf>>,
        }
        #[derive(Debug, Default, Clone, PartialEq, Record)]
        struct Root {
            #[stow(column = "z")]
            z: String,
            #[stow(column = "b_,inline")]
            branch: Branch,
        }
        let cache = MappingCache::new();
        let mapping = cache.mapping::<Root>().unwrap();
        assert_eq!(mapping.primary_keys(), ["b_c_id"]);
        assert_eq!(
            sorted(mapping.properties()),
            ["b_c_x", "b_y", "z"].map(String::from)
        );

        let mut value = Root {
            z: "Z".into(),
            branch: Branch {
                y: "Y".into(),
                leaf: None,
            },
        };
        assert!(mapping.id(&value).unwrap().is_null());
        let id = Uuid::new_v4();
        mapping.set_id(&mut value, Value::Uuid(Some(id))).unwrap();
        assert_eq!(
            value.branch.leaf.as_deref(),
            Some(&Leaf { id: Some(id), x: 0 })
        );
        assert_eq!(mapping.id(&value).unwrap(), Value::Uuid(Some(id)));

        value.branch.leaf.as_mut().unwrap().x = 7;
        let read = mapping.values(&value, true, Operation::Read).unwrap();
        assert_eq!(read.len(), 4);
        assert_eq!(read.get("b_c_id"), Some(&Value::Uuid(Some(id))));
        assert_eq!(read.get("b_c_x"), Some(&Value::Int32(Some(7))));
        assert_eq!(read.get("b_y"), Some(&text("Y")));
        assert_eq!(read.get("z"), Some(&text("Z")));

        let (names, row) = read.keys_values();
        let dests = mapping.dests(&names).unwrap();
        let mut scanned = Root::default();
        let extra = dests.scan(&mut scanned, row).unwrap();
        assert!(extra.is_empty());
        assert_eq!(scanned, value);
    }

    #[test]
    fn primary_key_cardinality() {
        #[derive(Default, Record)]
        struct NoKey {
            #[stow(column = "name")]
            name: String,
        }
        #[derive(Default, Record)]
        struct TwoKeys {
            #[stow(column = "a,pk")]
            a: Option<Uuid>,
            #[stow(column = "b,pk")]
            b: Option<Uuid>,
        }
        let cache = MappingCache::new();
        let mut value = NoKey::default();
        let mapping = cache.mapping::<NoKey>().unwrap();
        assert!(is_configuration(&mapping.id(&value).unwrap_err()));
        assert!(is_configuration(
            &mapping.set_id(&mut value, Value::Null).unwrap_err()
        ));
        assert!(is_configuration(&mapping.new_id().unwrap_err()));

        let value = TwoKeys::default();
        let mapping = cache.mapping::<TwoKeys>().unwrap();
        assert_eq!(mapping.primary_keys(), ["a", "b"]);
        assert!(is_configuration(&mapping.id(&value).unwrap_err()));
    }

    #[test]
    fn identifier_without_generator() {
        #[derive(Default, Record)]
        struct Named {
            #[stow(column = "id,pk")]
            id: String,
        }
        let cache = MappingCache::new();
        let mut value = Named::default();
        let mapping = cache.mapping::<Named>().unwrap();
        mapping.set_id(&mut value, text("abc")).unwrap();
        assert_eq!(value.id, "abc");
        let error = mapping.new_id().unwrap_err();
        assert!(is_configuration(&error));
        assert!(error.to_string().contains("cannot generate"), "{error}");
    }

    #[test]
    fn set_id_converts() {
        #[derive(Default, Record)]
        struct Numbered {
            #[stow(column = "id,pk")]
            id: i32,
        }
        let cache = MappingCache::new();
        let mut value = Numbered::default();
        let mapping = cache.mapping::<Numbered>().unwrap();
        assert!(mapping.id(&value).unwrap().is_empty());
        mapping.set_id(&mut value, Value::Int64(Some(42))).unwrap();
        assert_eq!(value.id, 42);
        assert!(
            mapping
                .set_id(&mut value, Value::Int64(Some(i64::MAX)))
                .is_err()
        );
        assert_eq!(value.id, 42);
    }

    #[test]
    fn invalid_annotations() {
        #[derive(Default, Record)]
        struct UnknownFlag {
            #[stow(column = "id,pk,unique")]
            id: Option<Uuid>,
        }
        #[derive(Default, Record)]
        struct Duplicate {
            #[stow(column = "id,pk")]
            id: Option<Uuid>,
            #[stow(column = "id")]
            other: String,
        }
        #[derive(Default, Record)]
        struct NotInline {
            #[stow(column = "id,pk")]
            id: Option<Uuid>,
            #[stow(embed, column = "nested")]
            nested: Inline,
        }
        #[derive(Default, Record)]
        struct FlaggedInline {
            #[stow(column = "id,pk")]
            id: Option<Uuid>,
            #[stow(column = "p_,inline,ro")]
            nested: Inline,
        }
        let cache = MappingCache::new();
        for error in [
            cache.mapping::<UnknownFlag>().unwrap_err(),
            cache.mapping::<Duplicate>().unwrap_err(),
            cache.mapping::<NotInline>().unwrap_err(),
            cache.mapping::<FlaggedInline>().unwrap_err(),
        ] {
            assert!(is_configuration(&error), "{error:#}");
        }
        assert!(cache.is_empty());
    }

    #[test]
    fn cached_once() {
        let cache = MappingCache::new();
        let first = cache.mapping::<Embedding>().unwrap();
        let second = cache.mapping::<Embedding>().unwrap();
        assert!(std::sync::Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 3);
        assert_eq!(Embedding::record_type().name, "Embedding");
    }
}

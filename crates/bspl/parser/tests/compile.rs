use bspl_parser::{compile, compile_with_rules, BsplError, LexerRules, Parser};
use bspl_types::{Scope, ValidationError};

const PROTO_NAME: &str = "ProtoName{role Buyer, Seller
parameter out ID key, out item, out price

Buyer -> Seller: Request[out ID key, out item]
Buyer -> Seller: Offer[in ID key, in item, out price]
}";

#[test]
fn test_example_protocol_validates() {
    let protocol = compile(PROTO_NAME).unwrap();
    assert_eq!(protocol.name, "ProtoName");
    assert_eq!(protocol.key(), "ProtoName,ID");

    let offer = protocol.find_action("Offer").unwrap();
    assert_eq!(offer.params[2].scope, Scope::Out);
}

#[test]
fn test_unknown_role_in_action_is_a_parse_error() {
    let source = PROTO_NAME.replace("Buyer -> Seller: Offer", "Buyer -> Broker: Offer");
    let err = compile(&source).unwrap_err();
    match err.cause() {
        BsplError::Parse { found, .. } => assert_eq!(found, "Broker"),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_missing_protocol_key_fails_during_parse() {
    let source = PROTO_NAME.replace("out ID key, out item, out price", "out ID, out item, out price");
    let err = Parser::parse(&source).unwrap_err();
    assert!(matches!(
        err.cause(),
        BsplError::Validation(ValidationError::NoKeyParameters(_))
    ));
}

#[test]
fn test_cycle_names_an_action_on_it() {
    let source = "Cycle {
  role A, B
  parameter out ID key, out x, out y, out z

  A -> B: Start[out ID key, out z]
  A -> B: Left[in ID key, in y, out x]
  B -> A: Right[in ID key, in x, out y]
}";
    match compile(source) {
        Err(BsplError::Validation(ValidationError::CircularDependency(action))) => {
            assert!(action == "Left" || action == "Right", "{}", action);
        }
        other => panic!("expected a cycle, got {:?}", other),
    }
}

#[test]
fn test_reserved_word_as_action_name() {
    let source = PROTO_NAME.replace("Request", "key");
    let err = compile(&source).unwrap_err();
    assert!(matches!(err.cause(), BsplError::Reserved { word, .. } if word == "key"));
}

#[test]
fn test_malformed_parameter_group() {
    let source = PROTO_NAME.replace("out item]", "out item extra words]");
    let err = compile(&source).unwrap_err();
    assert!(matches!(err.cause(), BsplError::Param { .. }));
    assert!(!err.consumed().is_empty());
}

#[test]
fn test_duplicate_action_parameter() {
    let source = PROTO_NAME.replace("out ID key, out item]", "out ID key, in ID]");
    let err = compile(&source).unwrap_err();
    assert!(matches!(err.cause(), BsplError::Param { .. }));
}

#[test]
fn test_compile_with_rules_from_json() {
    let rules = LexerRules::from_json(r#"{ "comment_prefix": "//" }"#).unwrap();
    let source = format!("// purchase\n{}\n// end", PROTO_NAME);
    let protocol = compile_with_rules(&source, &rules).unwrap();
    assert_eq!(protocol.actions.len(), 2);

    assert!(matches!(compile(&source), Err(BsplError::Tokenize { ch: '/', .. })));
}

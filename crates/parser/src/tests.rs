use crate::{parse_source, ParseNode, ParserError};

const HEARTBEAT: &str = r#"
// Watchdog that raises an alarm after three missed heartbeats.
automaton <id : int> heartbeat_monitor (hb : in msgHeartbeat, tick : in msgTick, alarm : out msgAlarm) {
    variables {
        missed : int = 0;
        threshold : int = 3;
    }
    transitions {
        ctx.read("hb") != null -> ctx.set_var("missed", Value::from(0));
        ctx.read("tick") != null -> {
            ctx.set_var("missed", ctx.var("missed") + Value::from(1));
        }
        ctx.var("missed") >= ctx.var("threshold") -> {
            ctx.write("alarm", true.into());
            sync alarm;
        }
    }
}
"#;

fn names(node: &ParseNode) -> Vec<&str> {
    node.children().iter().filter_map(|c| c.name()).collect()
}

#[test]
fn parse_automaton_shape() {
    let tree = parse_source(HEARTBEAT).expect("parse heartbeat automaton");
    assert_eq!(tree.name(), Some("program"));
    assert_eq!(names(&tree), vec!["automaton_decl"]);

    let auto = &tree.children()[0];
    assert_eq!(
        names(auto),
        vec!["template", "ident", "port_list", "variables_block", "transitions_block"]
    );
    assert_eq!(auto.children()[1].leaf(), Some("heartbeat_monitor"));

    let ports = &auto.children()[2];
    assert_eq!(ports.children().len(), 3);
    let alarm = &ports.children()[2];
    assert_eq!(alarm.children()[0].leaf(), Some("alarm"));
    assert_eq!(alarm.children()[1].leaf(), Some("out"));
}

#[test]
fn parse_transitions_in_order() {
    let tree = parse_source(HEARTBEAT).expect("parse heartbeat automaton");
    let auto = &tree.children()[0];
    let transitions = &auto.children()[4];
    assert_eq!(transitions.children().len(), 3);

    let guards: Vec<String> = transitions
        .children()
        .iter()
        .map(|t| t.children()[0].leaf().unwrap().trim().to_string())
        .collect();
    assert_eq!(guards[0], r#"ctx.read("hb") != null"#);
    assert_eq!(guards[1], r#"ctx.read("tick") != null"#);
    assert_eq!(guards[2], r#"ctx.var("missed") >= ctx.var("threshold")"#);
}

#[test]
fn parse_typedef_and_array_type() {
    let tree = parse_source("typedef array[array[int, 3], 4] as grid;").expect("parse typedef");
    let td = &tree.children()[0];
    assert_eq!(td.name(), Some("typedef_decl"));
    let outer = &td.children()[0];
    assert_eq!(outer.name(), Some("array_type"));
    let inner = &outer.children()[0];
    assert_eq!(inner.name(), Some("array_type"));
    // The element is a type_ref wrapping an ident; the token sits one
    // level below the reference node.
    let element = &inner.children()[0];
    assert_eq!(element.name(), Some("type_ref"));
    assert_eq!(element.children()[0].leaf(), Some("int"));
    assert_eq!(td.children()[1].leaf(), Some("grid"));
}

#[test]
fn parse_system_with_connections() {
    let src = "
        system monitor_net {
            components {
                m1 : heartbeat_monitor;
                sink : alarm_sink;
            }
            internals n0, n1;
            connections {
                m1.alarm -> sink.input;
            }
        }
    ";
    let tree = parse_source(src).expect("parse system");
    let sys = &tree.children()[0];
    assert_eq!(
        names(sys),
        vec!["ident", "components_block", "internals_decl", "connections_block"]
    );
    let conns = &sys.children()[3];
    let conn = &conns.children()[0];
    assert_eq!(conn.children().len(), 2);
    assert_eq!(conn.children()[0].children()[0].leaf(), Some("m1"));
    assert_eq!(conn.children()[0].children()[1].leaf(), Some("alarm"));
}

#[test]
fn parse_function_with_defaults() {
    let src = "
        function clamp (x : int, hi : int = 10) : int {
            variables {
                r : int;
            }
            statements {
                r = x;
                return r;
            }
        }
    ";
    let tree = parse_source(src).expect("parse function");
    let f = &tree.children()[0];
    assert_eq!(f.name(), Some("function_decl"));
    assert_eq!(
        names(f),
        vec!["ident", "arg_list", "type_ref", "variables_block", "statements_block"]
    );
    let args = &f.children()[1];
    let hi = &args.children()[1];
    assert_eq!(hi.children()[2].leaf(), Some("10"));
}

#[test]
fn syntax_error_reports_position() {
    let err = parse_source("automaton broken {").expect_err("missing port list must fail");
    match err {
        ParserError::Syntax { line, column, .. } => {
            assert_eq!(line, 1);
            assert!(column > 1);
        }
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn pretty_dump_round_trips() {
    let tree = parse_source(HEARTBEAT).expect("parse heartbeat automaton");
    let dump = tree.pretty();
    let reread = ParseNode::from_pretty(&dump).expect("re-read dump");
    assert_eq!(tree, reread);
    // The dump itself is canonical: dumping the re-read tree changes nothing.
    assert_eq!(dump, reread.pretty());
}

#[test]
fn pretty_escapes_token_text() {
    let node = ParseNode::Token {
        text: "a\"b\\c\nd".to_string(),
        line: 1,
        col: 1,
    };
    let wrapped = ParseNode::Rule {
        name: "guard".to_string(),
        children: vec![node],
        line: 1,
        col: 1,
    };
    let reread = ParseNode::from_pretty(&wrapped.pretty()).expect("re-read escaped dump");
    assert_eq!(wrapped, reread);
}

#[test]
fn malformed_dump_is_rejected() {
    assert!(matches!(
        ParseNode::from_pretty("program\n   oddly_indented\n"),
        Err(ParserError::MalformedDump(2, _))
    ));
    assert!(matches!(
        ParseNode::from_pretty("\"token at root\"\n"),
        Err(ParserError::MalformedDump(1, _))
    ));
    assert!(matches!(
        ParseNode::from_pretty(""),
        Err(ParserError::MalformedDump(0, _))
    ));
}

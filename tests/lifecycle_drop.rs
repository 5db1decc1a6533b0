use deep_observe::{array, attach, detach, object, wrap, Binder, ChangeNotifier, Function, Value};
use std::cell::Cell;
use std::rc::Rc;

fn counting_notifier(count: &Rc<Cell<usize>>) -> ChangeNotifier {
    let count = count.clone();
    ChangeNotifier::from_fn(move |_| count.set(count.get() + 1))
}

#[test]
fn test_detach_releases_the_notifier() {
    let count = Rc::new(Cell::new(0));
    let root = attach(object! { "a" => 1 }, counting_notifier(&count)).unwrap();

    // One handle here, one inside the notifier
    assert_eq!(Rc::strong_count(&count), 2);

    detach(&root);
    assert_eq!(Rc::strong_count(&count), 1, "notifier closure should be dropped at detach");

    root.set("a", 2).unwrap();
    assert_eq!(count.get(), 0);
    assert_eq!(root.get("a"), Value::from(2));
}

#[test]
fn test_root_drop_quiesces_retained_children() {
    let count = Rc::new(Cell::new(0));
    let host = object! { "list" => array![object! { "name" => "bob" }] };

    let child = {
        let root = attach(host.clone(), counting_notifier(&count)).unwrap();
        root.get("list").get(0)
        // root drops here
    };

    child.as_node().unwrap().set("name", "ann").unwrap();
    assert_eq!(count.get(), 0);
    assert_eq!(Rc::strong_count(&count), 1);
    assert_eq!(host.get("list").get(0).get("name"), Value::from("ann"));
}

#[test]
fn test_dropping_a_wrapped_graph_frees_its_notifier() {
    let count = Rc::new(Cell::new(0));

    {
        let state = wrap(
            object! { "user" => object! { "tags" => array!["a", "b"] } },
            counting_notifier(&count),
        );
        state.get("user").as_node().unwrap().set("age", 3).unwrap();
        assert_eq!(count.get(), 1);
        // state and its raw object drop here
    }

    assert_eq!(Rc::strong_count(&count), 1, "graph should not outlive its last handle");
}

#[test]
fn test_bound_method_after_drop_sees_no_root() {
    let host = object! {
        "count" => 0,
        "bump" => Function::new("bump", |this, _| {
            match this.as_node() {
                Some(node) => {
                    let next = node.get("count").as_f64().unwrap_or(0.0) + 1.0;
                    node.set("count", next)?;
                    Ok(Value::from(true))
                }
                None => Ok(Value::from(false)),
            }
        }),
    };

    let root = Binder::new()
        .bind_method("bump")
        .attach(host.clone(), ChangeNotifier::noop())
        .unwrap();
    let bump = host.get("bump");
    let bump = bump.as_function().unwrap();

    assert_eq!(bump.call(&[]).unwrap(), Value::from(true));
    drop(root);
    assert_eq!(bump.call(&[]).unwrap(), Value::from(false));
    assert_eq!(host.get("count"), Value::from(1));
}

#[test]
fn test_detach_twice_is_a_no_op() {
    let count = Rc::new(Cell::new(0));
    let root = attach(object! {}, counting_notifier(&count)).unwrap();

    detach(&root);
    detach(&root);
    root.detach();
    drop(root);

    assert_eq!(count.get(), 0);
}

#[test]
fn test_reattach_observes_nested_fields_again() {
    let first = Rc::new(Cell::new(0));
    let second = Rc::new(Cell::new(0));
    let host = object! { "user" => object! { "name" => "bob" }, "list" => array![] };

    let root = attach(host.clone(), counting_notifier(&first)).unwrap();
    detach(&root);
    drop(root);

    let root = attach(host.clone(), counting_notifier(&second)).unwrap();
    root.set("n", 1).unwrap();
    root.get("user").as_node().unwrap().set("name", "ann").unwrap();
    root.get("list").as_node().unwrap().push(1).unwrap();

    assert_eq!(first.get(), 0);
    assert_eq!(second.get(), 3);
    assert_eq!(host.get("user").get("name"), Value::from("ann"));
}

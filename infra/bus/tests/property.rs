pub mod fixtures;

use fixtures::{Recorder, TestEvent};
use proptest::prelude::*;
use typebus::Bus;

#[derive(Debug, Clone)]
enum Op {
    Subscribe,
    /// Index into the tokens issued so far (modulo their count).
    Unsubscribe(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![3 => Just(Op::Subscribe), 2 => any::<usize>().prop_map(Op::Unsubscribe)]
}

const LABELS: [&str; 8] = ["h0", "h1", "h2", "h3", "h4", "h5", "h6", "h7"];

proptest! {
    #[test]
    fn publish_reaches_exactly_the_live_handlers_in_order(ops in proptest::collection::vec(op(), 0..64)) {
        let bus = Bus::new();
        let recorder = Recorder::new();
        let mut issued = Vec::new();
        let mut live: Vec<&'static str> = Vec::new();

        for op in ops {
            match op {
                Op::Subscribe => {
                    let label = LABELS[issued.len() % LABELS.len()];
                    issued.push((recorder.subscribe(&bus, label), label));
                    live.push(label);
                },
                Op::Unsubscribe(_) if issued.is_empty() => {},
                Op::Unsubscribe(index) => {
                    let (token, label) = issued[index % issued.len()];
                    let was_live = bus.contains::<TestEvent>(token);
                    prop_assert_eq!(bus.unsubscribe::<TestEvent>(token), was_live);
                    if was_live {
                        let position = issued
                            .iter()
                            .filter(|(t, _)| *t == token || bus.contains::<TestEvent>(*t))
                            .position(|(t, _)| *t == token)
                            .expect("token was live");
                        prop_assert_eq!(live.remove(position), label);
                    }
                },
            }
        }

        let delivered = bus.publish(&TestEvent(0)).expect("infallible handlers");
        prop_assert_eq!(delivered, live.len());
        prop_assert_eq!(recorder.labels(), live);
    }
}

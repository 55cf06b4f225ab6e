use volley_types::Priority;

#[test]
fn default_priority_is_normal() {
    assert_eq!(Priority::default(), Priority::Normal);
}

#[test]
fn ordering_is_low_normal_high_immediate() {
    let mut priorities = vec![
        Priority::High,
        Priority::Low,
        Priority::Immediate,
        Priority::Normal,
    ];
    priorities.sort();
    assert_eq!(
        priorities,
        vec![
            Priority::Low,
            Priority::Normal,
            Priority::High,
            Priority::Immediate
        ]
    );
}

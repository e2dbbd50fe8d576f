#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub const USER_CONTROLLER: &str = r#"package com.example.web;

import com.example.service.UserService;
import org.springframework.web.bind.annotation.GetMapping;
import org.springframework.web.bind.annotation.RestController;

/**
 * Users API. class NotAClass {}
 */
@RestController
public class UserController {
    private final UserService userService;

    public UserController(UserService userService) {
        this.userService = userService;
    }

    @GetMapping
    public User getUser(Long id) {
        return userService.find(id);
    }
}
"#;

pub const USER_SERVICE: &str = r#"package com.example.service;

@Service
public class UserService {
}
"#;

pub const ORDER_CONTROLLER: &str = r#"package com.shop.api;

import java.util.List;

@RestController
@RequestMapping("/api/orders")
public class OrderController extends BaseController implements Auditable {
    private final OrderService orders;

    OrderController(OrderService orders) { this.orders = orders; }

    @GetMapping
    public List<Order> list() {
        return orders.findAll();
    }

    @Audited("create")
    @PostMapping(value = "/create", consumes = "application/xml")
    public Order create(@RequestBody Order order) {
        audit("create");
        return orders.save(order);
    }

    // @DeleteMapping("/legacy") public void legacy() {}
    static class Page {
        int size = 20;
    }
}
"#;

pub const BASE_CONTROLLER: &str = r#"package com.shop.api;

import java.util.HashMap;
import java.util.List;
import java.util.Map;

public abstract class BaseController {
    private final Map<String, Integer> counts = new HashMap<String, Integer>();

    protected void audit(String action) {
        log(action, 1);
    }

    private void log(String message, int level) {}

    protected <T> List<T> page(List<T> items, int offset, int limit) {
        return items.subList(offset, offset + limit);
    }
}
"#;

pub const AUDITABLE: &str = r#"package com.shop.api;

public interface Auditable {
    default String auditName() {
        return getClass().getSimpleName();
    }
}
"#;

pub const AUDITED: &str = r#"package com.shop.api;

public @interface Audited {
    String value() default "";
}
"#;

pub const ORDER_SERVICE: &str = r#"package com.shop.service;

import com.shop.model.Order;
import java.util.List;

public interface OrderService {
    List<Order> findAll();

    Order save(Order order);
}
"#;

pub const STATUS: &str = r#"package com.shop.model;

public enum Status {
    NEW, PAID;

    public boolean isFinal() {
        return this == PAID;
    }
}
"#;

pub fn shop_sources() -> Vec<(String, String)> {
    [
        ("src/com/shop/api/OrderController.java", ORDER_CONTROLLER),
        ("src/com/shop/api/BaseController.java", BASE_CONTROLLER),
        ("src/com/shop/api/Auditable.java", AUDITABLE),
        ("src/com/shop/api/Audited.java", AUDITED),
        ("src/com/shop/service/OrderService.java", ORDER_SERVICE),
        ("src/com/shop/model/Status.java", STATUS),
    ]
    .into_iter()
    .map(|(path, text)| (path.to_string(), text.to_string()))
    .collect()
}

pub fn write_sources(root: &Path, sources: &[(String, String)]) {
    for (rel, text) in sources {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, text).unwrap();
    }
}
